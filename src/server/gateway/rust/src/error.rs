/* src/server/gateway/rust/src/error.rs */

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// Credentials or endpoint are missing or malformed.
  Config,
  /// The request never produced a response.
  Transport,
  /// The platform answered with a non-success status.
  Status,
  /// The response body did not have the expected shape.
  Decode,
  /// The gateway is running in stub mode.
  Unavailable,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Config => "CONFIG",
      Self::Transport => "TRANSPORT",
      Self::Status => "STATUS",
      Self::Decode => "DECODE",
      Self::Unavailable => "UNAVAILABLE",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
  kind: ErrorKind,
  message: String,
  status: Option<u16>,
}

impl GatewayError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into(), status: None }
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::new(ErrorKind::Config, msg)
  }

  pub fn transport(msg: impl Into<String>) -> Self {
    Self::new(ErrorKind::Transport, msg)
  }

  pub fn status(status: u16, msg: impl Into<String>) -> Self {
    Self { kind: ErrorKind::Status, message: msg.into(), status: Some(status) }
  }

  pub fn decode(msg: impl Into<String>) -> Self {
    Self::new(ErrorKind::Decode, msg)
  }

  pub fn unavailable(msg: impl Into<String>) -> Self {
    Self::new(ErrorKind::Unavailable, msg)
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  /// HTTP status of a `Status` error.
  pub fn http_status(&self) -> Option<u16> {
    self.status
  }

  /// True when the failure says nothing about the data itself: the platform
  /// could not be reached or the gateway is stubbed.
  pub fn is_connectivity(&self) -> bool {
    matches!(self.kind, ErrorKind::Transport | ErrorKind::Unavailable | ErrorKind::Config)
      || self.status.is_some_and(|s| s >= 500)
  }
}

impl fmt::Display for GatewayError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(status) => write!(f, "{} ({status}): {}", self.kind.as_str(), self.message),
      None => write!(f, "{}: {}", self.kind.as_str(), self.message),
    }
  }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      Self::decode(err.to_string())
    } else if let Some(status) = err.status() {
      Self::status(status.as_u16(), err.to_string())
    } else {
      Self::transport(err.to_string())
    }
  }
}
