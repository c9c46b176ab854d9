/* src/cli/core/src/site.rs */

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use purr_server::purr_gateway::{LazyGateway, MemoryGateway};
use purr_server::{Site, Templates};

use crate::config::PurrConfig;
use crate::ui::{self, DIM, RESET};

/// Assemble the site from config. With `fixtures`, reads come from an
/// in-memory backend loaded from that JSON file instead of the network.
pub(crate) fn build_site(config: &PurrConfig, fixtures: Option<&Path>) -> Result<Site> {
  let gateway = match fixtures {
    Some(path) => {
      let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixtures {}", path.display()))?;
      let memory = MemoryGateway::from_json(&json)
        .with_context(|| format!("invalid fixtures {}", path.display()))?;
      ui::detail(&format!("{DIM}backend: fixtures {}{RESET}", path.display()));
      LazyGateway::ready(Arc::new(memory))
    }
    None => LazyGateway::new(config.gateway.gateway_config()),
  };

  let mut templates = Templates::builtin()?;
  if let Some(dir) = &config.build.templates_dir {
    let dir = config.resolve(dir);
    templates = templates.with_overrides(&dir).with_context(|| format!("templates in {}", dir.display()))?;
  }

  let site = Site::new(gateway)?
    .templates(templates)?
    .document(config.document.document_config())
    .meta(config.site.clone());
  Ok(site)
}
