/* src/server/adapter/axum/src/error.rs */

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use purr_server::SiteError;

const ERROR_PAGE: &str = concat!(
  "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
  "<title>Something went wrong</title></head><body>",
  "<h1>Something went wrong</h1><p>Please try again in a moment.</p>",
  "</body></html>"
);

/// A render failure the pipeline could not recover from. Details go to
/// the log; the visitor gets a generic page.
pub(crate) struct AxumError(pub SiteError);

impl From<SiteError> for AxumError {
  fn from(err: SiteError) -> Self {
    Self(err)
  }
}

impl IntoResponse for AxumError {
  fn into_response(self) -> Response {
    let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::error!(code = self.0.code(), error = %self.0.message(), status = status.as_u16(), "request failed");
    (status, Html(ERROR_PAGE)).into_response()
  }
}
