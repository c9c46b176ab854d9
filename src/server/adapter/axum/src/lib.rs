/* src/server/adapter/axum/src/lib.rs */

mod error;
mod handler;

use std::sync::Arc;

use purr_server::Site;

pub use handler::ACCESS_COOKIE;
/// Re-export purr-server core for convenience
pub use purr_server;

/// Extension trait that turns a `Site` into an Axum router.
pub trait IntoAxumRouter {
  fn into_axum_router(self) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoAxumRouter for Arc<Site> {
  fn into_axum_router(self) -> axum::Router {
    handler::build_router(self)
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "purrhaven site listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
  }
}

impl IntoAxumRouter for Site {
  fn into_axum_router(self) -> axum::Router {
    Arc::new(self).into_axum_router()
  }

  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    Arc::new(self).serve(addr).await
  }
}

/// Resolves on Ctrl-C; in-flight requests finish before `serve` returns.
pub async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %err, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
