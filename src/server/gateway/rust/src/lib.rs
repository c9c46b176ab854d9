/* src/server/gateway/rust/src/lib.rs */

//! Single entry point for every read, write, auth check, upload and
//! realtime subscription against the hosted backend.
//!
//! Acquire a gateway with [`connect`] (or lazily through [`LazyGateway`]).
//! When credentials are missing or the platform is unreachable the result
//! is a [`StubGateway`] whose operations all fail with
//! [`ErrorKind::Unavailable`]; callers never see a panic.

pub mod config;
pub mod connect;
pub mod error;
pub mod memory;
pub mod query;
pub mod realtime;
pub mod rest;
pub mod stub;

use std::future::Future;
use std::pin::Pin;

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use config::GatewayConfig;
pub use connect::{LazyGateway, connect};
pub use error::{ErrorKind, GatewayError};
pub use memory::MemoryGateway;
pub use query::{Filter, Order, Select};
pub use rest::RestGateway;
pub use stub::StubGateway;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
  Live,
  Stub,
  Memory,
}

/// A user as the auth service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: String,
  #[serde(default)]
  pub email: Option<String>,
  /// Raw role claim (`app_metadata.role`), if any.
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub expires_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table: String,
  pub kind: ChangeKind,
  #[serde(default)]
  pub record: Value,
  #[serde(default)]
  pub old_record: Value,
}

pub trait DataGateway: Send + Sync {
  fn mode(&self) -> GatewayMode;

  fn select<'a>(&'a self, select: &'a Select) -> BoxFuture<'a, GatewayResult<Vec<Value>>>;

  fn insert<'a>(&'a self, table: &'a str, rows: Vec<Value>) -> BoxFuture<'a, GatewayResult<Vec<Value>>>;

  fn update<'a>(
    &'a self,
    table: &'a str,
    filters: &'a [Filter],
    patch: Value,
  ) -> BoxFuture<'a, GatewayResult<Vec<Value>>>;

  fn delete<'a>(&'a self, table: &'a str, filters: &'a [Filter]) -> BoxFuture<'a, GatewayResult<Vec<Value>>>;

  /// Validate an access token remotely. `Ok(None)` when the platform
  /// rejects it.
  fn user<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, GatewayResult<Option<AuthUser>>>;

  /// Store an object and return its public URL.
  fn upload<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a str,
    bytes: Vec<u8>,
    content_type: &'a str,
  ) -> BoxFuture<'a, GatewayResult<String>>;

  fn subscribe<'a>(&'a self, table: &'a str) -> BoxFuture<'a, GatewayResult<BoxStream<GatewayResult<ChangeEvent>>>>;

  /// Cheap liveness read.
  fn probe(&self) -> BoxFuture<'_, GatewayResult<()>>;
}
