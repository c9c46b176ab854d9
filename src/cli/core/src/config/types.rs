/* src/cli/core/src/config/types.rs */

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use purr_server::SiteMeta;
use purr_server::purr_engine::{DocumentConfig, DocumentIds};
use purr_server::purr_gateway::GatewayConfig;
use purr_server::purr_gateway::config::{DEFAULT_KEY_VAR, DEFAULT_PROBE_TABLE, DEFAULT_URL_VAR};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurrConfig {
  #[serde(default)]
  pub site: SiteMeta,
  #[serde(default)]
  pub gateway: GatewaySection,
  #[serde(default)]
  pub build: BuildSection,
  #[serde(default)]
  pub document: DocumentSection,
  #[serde(default)]
  pub serve: ServeSection,
  /// Directory holding `purr.toml`. Relative paths resolve against it.
  #[serde(skip)]
  pub root: PathBuf,
}

/// Names of the environment variables carrying the backend endpoint and
/// key. The values themselves never live in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
  #[serde(default = "default_url_env")]
  pub url_env: String,
  #[serde(default = "default_key_env")]
  pub key_env: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default = "default_probe_table")]
  pub probe_table: String,
}

impl Default for GatewaySection {
  fn default() -> Self {
    Self {
      url_env: default_url_env(),
      key_env: default_key_env(),
      timeout_secs: default_timeout_secs(),
      probe_table: default_probe_table(),
    }
  }
}

impl GatewaySection {
  pub fn gateway_config(&self) -> GatewayConfig {
    GatewayConfig::from_env(&self.url_env, &self.key_env)
      .with_timeout(Duration::from_secs(self.timeout_secs))
      .with_probe_table(self.probe_table.clone())
  }
}

fn default_url_env() -> String {
  DEFAULT_URL_VAR.to_string()
}

fn default_key_env() -> String {
  DEFAULT_KEY_VAR.to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

fn default_probe_table() -> String {
  DEFAULT_PROBE_TABLE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
  #[serde(default = "default_out_dir")]
  pub out_dir: String,
  #[serde(default = "default_concurrency")]
  pub concurrency: usize,
  /// Static assets, copied to `<out_dir>/assets` and served at `/assets`.
  #[serde(default = "default_public_dir")]
  pub public_dir: String,
  /// Optional directory of `*.html` template overrides.
  pub templates_dir: Option<String>,
}

impl Default for BuildSection {
  fn default() -> Self {
    Self {
      out_dir: default_out_dir(),
      concurrency: default_concurrency(),
      public_dir: default_public_dir(),
      templates_dir: None,
    }
  }
}

fn default_out_dir() -> String {
  "dist".to_string()
}

fn default_concurrency() -> usize {
  8
}

fn default_public_dir() -> String {
  "public".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSection {
  #[serde(default = "default_lang")]
  pub lang: String,
  #[serde(default = "default_title")]
  pub title: String,
  #[serde(default)]
  pub stylesheets: Vec<String>,
  #[serde(default)]
  pub scripts: Vec<String>,
}

impl Default for DocumentSection {
  fn default() -> Self {
    Self { lang: default_lang(), title: default_title(), stylesheets: Vec::new(), scripts: Vec::new() }
  }
}

impl DocumentSection {
  pub fn document_config(&self) -> DocumentConfig {
    DocumentConfig {
      ids: DocumentIds::default(),
      lang: self.lang.clone(),
      default_title: self.title.clone(),
      stylesheets: self.stylesheets.clone(),
      scripts: self.scripts.clone(),
    }
  }
}

fn default_lang() -> String {
  "en".to_string()
}

fn default_title() -> String {
  "Purrhaven Cat Rescue".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

impl Default for ServeSection {
  fn default() -> Self {
    Self { host: default_host(), port: default_port() }
  }
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  3000
}

impl PurrConfig {
  pub fn validate(&self) -> Result<()> {
    if self.gateway.url_env.trim().is_empty() || self.gateway.key_env.trim().is_empty() {
      bail!("gateway.url_env and gateway.key_env must name environment variables");
    }
    if self.gateway.timeout_secs == 0 {
      bail!("gateway.timeout_secs must be at least 1");
    }
    if self.build.concurrency == 0 {
      bail!("build.concurrency must be at least 1");
    }
    if self.build.out_dir.trim().is_empty() {
      bail!("build.out_dir must not be empty");
    }
    if self.site.name.trim().is_empty() {
      bail!("site.name must not be empty");
    }
    if self.document.lang.trim().is_empty() {
      bail!("document.lang must not be empty");
    }
    Ok(())
  }

  pub fn resolve(&self, path: &str) -> PathBuf {
    self.root.join(path)
  }

  pub fn out_dir(&self) -> PathBuf {
    self.resolve(&self.build.out_dir)
  }

  pub fn public_dir(&self) -> PathBuf {
    self.resolve(&self.build.public_dir)
  }
}
