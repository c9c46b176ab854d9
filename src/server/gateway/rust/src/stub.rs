/* src/server/gateway/rust/src/stub.rs */

use serde_json::Value;

use crate::{
  AuthUser, BoxFuture, BoxStream, ChangeEvent, DataGateway, Filter, GatewayError, GatewayMode,
  GatewayResult, Select,
};

/// Stand-in used when no live backend is available. Every operation fails
/// with an `Unavailable` error carrying the degradation reason.
#[derive(Debug, Clone)]
pub struct StubGateway {
  reason: String,
}

impl StubGateway {
  pub fn new(reason: impl Into<String>) -> Self {
    Self { reason: reason.into() }
  }

  pub fn reason(&self) -> &str {
    &self.reason
  }

  fn fail<'a, T: Send + 'a>(&self) -> BoxFuture<'a, GatewayResult<T>> {
    let err = GatewayError::unavailable(self.reason.clone());
    Box::pin(async move { Err(err) })
  }
}

impl DataGateway for StubGateway {
  fn mode(&self) -> GatewayMode {
    GatewayMode::Stub
  }

  fn select<'a>(&'a self, _select: &'a Select) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    self.fail()
  }

  fn insert<'a>(&'a self, _table: &'a str, _rows: Vec<Value>) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    self.fail()
  }

  fn update<'a>(
    &'a self,
    _table: &'a str,
    _filters: &'a [Filter],
    _patch: Value,
  ) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    self.fail()
  }

  fn delete<'a>(&'a self, _table: &'a str, _filters: &'a [Filter]) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    self.fail()
  }

  fn user<'a>(&'a self, _access_token: &'a str) -> BoxFuture<'a, GatewayResult<Option<AuthUser>>> {
    self.fail()
  }

  fn upload<'a>(
    &'a self,
    _bucket: &'a str,
    _path: &'a str,
    _bytes: Vec<u8>,
    _content_type: &'a str,
  ) -> BoxFuture<'a, GatewayResult<String>> {
    self.fail()
  }

  fn subscribe<'a>(&'a self, _table: &'a str) -> BoxFuture<'a, GatewayResult<BoxStream<GatewayResult<ChangeEvent>>>> {
    self.fail()
  }

  fn probe(&self) -> BoxFuture<'_, GatewayResult<()>> {
    self.fail()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ErrorKind;
  use serde_json::json;

  #[tokio::test]
  async fn every_operation_is_unavailable() {
    let stub = StubGateway::new("gateway URL is not set");
    let select = Select::from("cats");
    let filters = [Filter::Eq("id".into(), json!(1))];

    let errors = vec![
      stub.select(&select).await.unwrap_err(),
      stub.insert("cats", vec![json!({})]).await.unwrap_err(),
      stub.update("cats", &filters, json!({})).await.unwrap_err(),
      stub.delete("cats", &filters).await.unwrap_err(),
      stub.user("token").await.unwrap_err(),
      stub.upload("photos", "a.jpg", vec![1], "image/jpeg").await.unwrap_err(),
      stub.subscribe("cats").await.err().unwrap(),
      stub.probe().await.unwrap_err(),
    ];
    for err in errors {
      assert_eq!(err.kind(), ErrorKind::Unavailable);
      assert_eq!(err.message(), "gateway URL is not set");
    }
    assert_eq!(stub.mode(), GatewayMode::Stub);
  }
}
