/* src/cli/core/src/inspect.rs */

use std::path::Path;

use anyhow::Result;
use purr_server::purr_gateway::{GatewayMode, connect};

use crate::config::PurrConfig;
use crate::site::build_site;
use crate::ui::{self, DIM, RESET};

/// Print every path a build would prerender, one per line.
pub(crate) async fn run_paths(config: &PurrConfig, fixtures: Option<&Path>) -> Result<()> {
  let site = build_site(config, fixtures)?;
  for path in site.static_paths().await {
    ui::line(&path);
  }
  Ok(())
}

/// Validate config, templates and credentials, then report whether the
/// backend answers.
pub(crate) async fn run_check(config: &PurrConfig) -> Result<()> {
  ui::banner("check", Some(&config.site.name));
  ui::ok(&format!("config {DIM}{}{RESET}", config.root.display()));

  build_site(config, None)?;
  ui::ok("templates");

  let gateway = config.gateway.gateway_config();
  match gateway.credentials() {
    Ok(creds) => ui::ok(&format!("credentials {DIM}{}{RESET}", creds.base)),
    Err(err) => {
      ui::warn(&format!(
        "credentials: {} {DIM}(set {} and {}){RESET}",
        err.message(),
        config.gateway.url_env,
        config.gateway.key_env
      ));
    }
  }

  match connect(&gateway).await.mode() {
    GatewayMode::Live => ui::ok("gateway live"),
    mode => ui::warn(&format!("gateway in {mode:?} mode; pages will render without backend data")),
  }
  Ok(())
}
