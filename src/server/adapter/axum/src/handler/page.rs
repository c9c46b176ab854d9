/* src/server/adapter/axum/src/handler/page.rs */

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use purr_server::{RenderOutcome, Site};

use crate::error::AxumError;

/// Cookie carrying the access token of a signed-in visitor.
pub const ACCESS_COOKIE: &str = "purr-access-token";

/// Access token from `Authorization: Bearer`, falling back to the session
/// cookie.
pub(crate) fn access_token(headers: &HeaderMap) -> Option<String> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if let Some(token) = bearer {
    return Some(token.to_string());
  }
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == ACCESS_COOKIE && !value.is_empty())
    .map(|(_, value)| value.to_string())
}

pub(super) async fn handle_page(
  State(site): State<Arc<Site>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  if method != Method::GET && method != Method::HEAD {
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    return Ok(response);
  }

  let url = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
  let token = access_token(&headers);
  let outcome = site.render_request(url, token.as_deref()).await?;
  let response = match outcome {
    RenderOutcome::Page { status, html } => {
      let status = StatusCode::from_u16(status.http_status()).unwrap_or(StatusCode::OK);
      tracing::debug!(url, status = status.as_u16(), "page rendered");
      (status, Html(html)).into_response()
    }
    RenderOutcome::Redirect { location } => {
      tracing::debug!(url, location = %location, "redirect");
      Redirect::to(&location).into_response()
    }
  };
  Ok(response)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
      map.append(name.clone(), HeaderValue::from_str(value).unwrap());
    }
    map
  }

  #[test]
  fn bearer_wins_over_cookie() {
    let map = headers(&[
      (header::AUTHORIZATION, "Bearer abc"),
      (header::COOKIE, "purr-access-token=xyz"),
    ]);
    assert_eq!(access_token(&map).as_deref(), Some("abc"));
  }

  #[test]
  fn cookie_among_others() {
    let map = headers(&[(header::COOKIE, "theme=dark; purr-access-token=xyz; lang=en")]);
    assert_eq!(access_token(&map).as_deref(), Some("xyz"));
  }

  #[test]
  fn no_token() {
    let map = headers(&[(header::COOKIE, "purr-access-token="), (header::AUTHORIZATION, "Basic Zm9v")]);
    assert_eq!(access_token(&map), None);
  }
}
