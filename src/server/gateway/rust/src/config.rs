/* src/server/gateway/rust/src/config.rs */

use std::time::Duration;

use reqwest::Url;

use crate::error::GatewayError;

pub const DEFAULT_URL_VAR: &str = "PURR_GATEWAY_URL";
pub const DEFAULT_KEY_VAR: &str = "PURR_GATEWAY_KEY";
pub const DEFAULT_PROBE_TABLE: &str = "cats";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
  pub url: Option<String>,
  pub key: Option<String>,
  pub timeout: Duration,
  /// Table read by the liveness probe.
  pub probe_table: String,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self { url: None, key: None, timeout: DEFAULT_TIMEOUT, probe_table: DEFAULT_PROBE_TABLE.to_string() }
  }
}

/// Endpoint and key that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub base: Url,
  pub key: String,
}

impl GatewayConfig {
  /// Read the endpoint and key from the named environment variables.
  /// Empty values count as unset.
  pub fn from_env(url_var: &str, key_var: &str) -> Self {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    Self { url: read(url_var), key: read(key_var), ..Self::default() }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_probe_table(mut self, table: impl Into<String>) -> Self {
    self.probe_table = table.into();
    self
  }

  pub fn credentials(&self) -> Result<Credentials, GatewayError> {
    let url = self.url.as_deref().ok_or_else(|| GatewayError::config("gateway URL is not set"))?;
    let key = self.key.as_deref().ok_or_else(|| GatewayError::config("gateway key is not set"))?;
    Ok(Credentials { base: validate_url(url)?, key: validate_key(key)?.to_string() })
  }
}

pub fn validate_url(raw: &str) -> Result<Url, GatewayError> {
  let mut url =
    Url::parse(raw.trim()).map_err(|e| GatewayError::config(format!("invalid gateway URL `{raw}`: {e}")))?;
  if !matches!(url.scheme(), "http" | "https") {
    return Err(GatewayError::config(format!("gateway URL must be http or https, got `{}`", url.scheme())));
  }
  if url.host_str().is_none_or(str::is_empty) {
    return Err(GatewayError::config(format!("gateway URL `{raw}` has no host")));
  }
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  url.set_query(None);
  url.set_fragment(None);
  Ok(url)
}

/// Accept a three-segment JWT or a prefixed platform key.
pub fn validate_key(raw: &str) -> Result<&str, GatewayError> {
  if raw.is_empty() {
    return Err(GatewayError::config("gateway key is empty"));
  }
  if raw.chars().any(char::is_whitespace) {
    return Err(GatewayError::config("gateway key contains whitespace"));
  }
  let is_jwt = {
    let parts: Vec<&str> = raw.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(is_base64url))
  };
  let is_prefixed = ["sb_publishable_", "sb_secret_"]
    .iter()
    .any(|prefix| raw.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty()));
  if is_jwt || is_prefixed {
    Ok(raw)
  } else {
    Err(GatewayError::config("gateway key is neither a JWT nor a publishable/secret key"))
  }
}

fn is_base64url(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'='
}
