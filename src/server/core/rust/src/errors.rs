/* src/server/core/rust/src/errors.rs */

use std::fmt;

use purr_engine::{DocumentError, RouteError};
use purr_injector::{RenderError, TemplateError};

#[derive(Debug)]
pub struct SiteError {
  code: String,
  message: String,
  status: u16,
}

fn default_status(code: &str) -> u16 {
  match code {
    "NOT_FOUND" => 404,
    "UNAVAILABLE" => 503,
    _ => 500,
  }
}

impl SiteError {
  pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
    Self { code: code.into(), message: message.into(), status }
  }

  pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
    let code = code.into();
    let status = default_status(&code);
    Self { code, message: message.into(), status }
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::with_code("NOT_FOUND", msg)
  }

  pub fn unavailable(msg: impl Into<String>) -> Self {
    Self::with_code("UNAVAILABLE", msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::with_code("INTERNAL_ERROR", msg)
  }

  pub fn template(msg: impl Into<String>) -> Self {
    Self::with_code("TEMPLATE_ERROR", msg)
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.status
  }
}

impl fmt::Display for SiteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code, self.message)
  }
}

impl std::error::Error for SiteError {}

impl From<DocumentError> for SiteError {
  fn from(err: DocumentError) -> Self {
    Self::with_code("DOCUMENT_ERROR", err.to_string())
  }
}

impl From<TemplateError> for SiteError {
  fn from(err: TemplateError) -> Self {
    Self::template(err.message())
  }
}

impl From<RenderError> for SiteError {
  fn from(err: RenderError) -> Self {
    Self::template(err.to_string())
  }
}

impl From<RouteError> for SiteError {
  fn from(err: RouteError) -> Self {
    Self::with_code("ROUTE_ERROR", err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses() {
    assert_eq!(SiteError::not_found("x").status(), 404);
    assert_eq!(SiteError::unavailable("x").status(), 503);
    assert_eq!(SiteError::internal("x").status(), 500);
    assert_eq!(SiteError::template("x").status(), 500);
    assert_eq!(SiteError::new("TEAPOT", "short and stout", 418).status(), 418);
  }

  #[test]
  fn display_format() {
    assert_eq!(SiteError::not_found("no such cat").to_string(), "NOT_FOUND: no such cat");
  }

  #[test]
  fn conversions_keep_detail() {
    let err: SiteError = RenderError::MissingTemplate("footer".into()).into();
    assert_eq!(err.code(), "TEMPLATE_ERROR");
    assert!(err.message().contains("footer"));
    let err: SiteError = DocumentError::MissingAnchor("</head>".into()).into();
    assert_eq!(err.status(), 500);
  }
}
