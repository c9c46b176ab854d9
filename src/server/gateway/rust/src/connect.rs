/* src/server/gateway/rust/src/connect.rs */

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::GatewayConfig;
use crate::rest::RestGateway;
use crate::stub::StubGateway;
use crate::DataGateway;

/// Validate credentials, probe the platform once, and return a live
/// gateway. Any failure yields a [`StubGateway`] carrying the reason.
pub async fn connect(config: &GatewayConfig) -> Arc<dyn DataGateway> {
  let gateway = match RestGateway::new(config) {
    Ok(gateway) => gateway,
    Err(err) => {
      tracing::warn!(error = %err, "gateway credentials unusable, running in stub mode");
      return Arc::new(StubGateway::new(err.message()));
    }
  };
  match gateway.probe().await {
    Ok(()) => {
      tracing::info!(url = %gateway.base_url(), "gateway connected");
      Arc::new(gateway)
    }
    Err(err) => {
      tracing::warn!(url = %gateway.base_url(), error = %err, "gateway probe failed, running in stub mode");
      Arc::new(StubGateway::new(format!("probe failed: {}", err.message())))
    }
  }
}

/// Acquires the gateway on first use and hands out the same instance
/// afterwards.
pub struct LazyGateway {
  config: GatewayConfig,
  cell: OnceCell<Arc<dyn DataGateway>>,
}

impl LazyGateway {
  pub fn new(config: GatewayConfig) -> Self {
    Self { config, cell: OnceCell::new() }
  }

  /// Already-acquired gateway, e.g. an in-memory backend for tests.
  pub fn ready(gateway: Arc<dyn DataGateway>) -> Self {
    Self { config: GatewayConfig::default(), cell: OnceCell::new_with(Some(gateway)) }
  }

  pub async fn get(&self) -> Arc<dyn DataGateway> {
    self.cell.get_or_init(|| connect(&self.config)).await.clone()
  }

  pub fn is_acquired(&self) -> bool {
    self.cell.initialized()
  }
}
