/* src/cli/core/src/config/loader.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::types::PurrConfig;

pub const CONFIG_FILE: &str = "purr.toml";

/// Walk up from `start` to the nearest directory holding `purr.toml`.
pub fn find_purr_config(start: &Path) -> Result<PathBuf> {
  for dir in start.ancestors() {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
      return Ok(candidate);
    }
  }
  bail!("no {CONFIG_FILE} found in {} or any parent directory", start.display());
}

pub fn load_purr_config(path: &Path) -> Result<PurrConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let mut config: PurrConfig =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
  config.validate().with_context(|| format!("invalid {}", path.display()))?;
  Ok(config)
}

/// An explicit `--config` path wins; otherwise search from the current
/// directory.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PurrConfig> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => {
      let cwd = std::env::current_dir().context("failed to read current directory")?;
      find_purr_config(&cwd)?
    }
  };
  tracing::debug!(path = %path.display(), "loading config");
  load_purr_config(&path)
}
