/* src/cli/core/src/serve.rs */

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use purr_server_axum::{IntoAxumRouter, shutdown_signal};
use tower_http::services::ServeDir;

use crate::config::PurrConfig;
use crate::site::build_site;
use crate::ui::{self, DIM, RESET};

pub(crate) async fn run_serve(config: &PurrConfig, port: Option<u16>, fixtures: Option<&Path>) -> Result<()> {
  ui::banner("serve", Some(&config.site.name));
  let site = Arc::new(build_site(config, fixtures)?);

  let mode = site.gateway().await.mode();
  ui::detail(&format!("{DIM}gateway: {mode:?}{RESET}"));

  let public = config.public_dir();
  let router = site.into_axum_router().nest_service("/assets", ServeDir::new(&public));

  let addr = format!("{}:{}", config.serve.host, port.unwrap_or(config.serve.port));
  let listener =
    tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
  let local = listener.local_addr()?;
  ui::ok(&format!("listening on http://{local}"));
  tracing::info!(addr = %local, assets = %public.display(), "server started");

  axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await.context("server error")?;
  Ok(())
}
