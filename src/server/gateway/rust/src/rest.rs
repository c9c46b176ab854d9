/* src/server/gateway/rust/src/rest.rs */

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::Value;

use crate::config::{Credentials, GatewayConfig};
use crate::query::filter_pairs;
use crate::{
  AuthUser, BoxFuture, BoxStream, ChangeEvent, DataGateway, Filter, GatewayError, GatewayMode,
  GatewayResult, Select, realtime,
};

/// Live client for the hosted platform's REST, auth, storage and realtime
/// endpoints.
#[derive(Debug, Clone)]
pub struct RestGateway {
  client: Client,
  base: Url,
  key: String,
  probe_table: String,
}

impl RestGateway {
  pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
    let Credentials { base, key } = config.credentials()?;
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(concat!("purrhaven/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| GatewayError::config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, base, key, probe_table: config.probe_table.clone() })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn endpoint(&self, path: &str) -> GatewayResult<Url> {
    self.base.join(path).map_err(|e| GatewayError::config(format!("invalid endpoint `{path}`: {e}")))
  }

  fn table_url(&self, table: &str, pairs: &[(String, String)]) -> GatewayResult<Url> {
    let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
    if !pairs.is_empty() {
      let mut query = url.query_pairs_mut();
      for (k, v) in pairs {
        query.append_pair(k, v);
      }
    }
    Ok(url)
  }

  fn request(&self, method: Method, url: Url, bearer: &str) -> RequestBuilder {
    self.client.request(method, url).header("apikey", &self.key).bearer_auth(bearer)
  }

  /// Public URL of a stored object.
  pub fn public_url(&self, bucket: &str, path: &str) -> GatewayResult<String> {
    Ok(self.endpoint(&format!("storage/v1/object/public/{bucket}/{}", path.trim_start_matches('/')))?.to_string())
  }

  async fn rows(&self, builder: RequestBuilder, what: &str) -> GatewayResult<Vec<Value>> {
    let resp = builder.send().await?;
    let resp = check_status(resp, what).await?;
    let body: Value = resp.json().await.map_err(|e| GatewayError::decode(format!("{what}: {e}")))?;
    match body {
      Value::Array(rows) => Ok(rows),
      Value::Null => Ok(Vec::new()),
      other => Ok(vec![other]),
    }
  }
}

async fn check_status(resp: Response, what: &str) -> GatewayResult<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  let detail = serde_json::from_str::<Value>(&body)
    .ok()
    .and_then(|v| v["message"].as_str().or_else(|| v["msg"].as_str()).map(String::from))
    .unwrap_or(body);
  Err(GatewayError::status(status.as_u16(), format!("{what}: {detail}")))
}

/// Map the auth service's user object to [`AuthUser`].
pub fn parse_user(body: &Value) -> Option<AuthUser> {
  let id = body["id"].as_str()?.to_string();
  Some(AuthUser {
    id,
    email: body["email"].as_str().map(String::from),
    role: body["app_metadata"]["role"].as_str().map(String::from),
    expires_at: None,
  })
}

impl DataGateway for RestGateway {
  fn mode(&self) -> GatewayMode {
    GatewayMode::Live
  }

  fn select<'a>(&'a self, select: &'a Select) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move {
      let url = self.table_url(&select.table, &select.to_query_pairs())?;
      let what = format!("select {}", select.table);
      self.rows(self.request(Method::GET, url, &self.key), &what).await
    })
  }

  fn insert<'a>(&'a self, table: &'a str, rows: Vec<Value>) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move {
      let url = self.table_url(table, &[])?;
      let builder = self
        .request(Method::POST, url, &self.key)
        .header("Prefer", "return=representation")
        .json(&rows);
      self.rows(builder, &format!("insert {table}")).await
    })
  }

  fn update<'a>(
    &'a self,
    table: &'a str,
    filters: &'a [Filter],
    patch: Value,
  ) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move {
      let url = self.table_url(table, &filter_pairs(filters))?;
      let builder = self
        .request(Method::PATCH, url, &self.key)
        .header("Prefer", "return=representation")
        .json(&patch);
      self.rows(builder, &format!("update {table}")).await
    })
  }

  fn delete<'a>(&'a self, table: &'a str, filters: &'a [Filter]) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move {
      if filters.is_empty() {
        return Err(GatewayError::config(format!("refusing to delete from {table} without filters")));
      }
      let url = self.table_url(table, &filter_pairs(filters))?;
      let builder =
        self.request(Method::DELETE, url, &self.key).header("Prefer", "return=representation");
      self.rows(builder, &format!("delete {table}")).await
    })
  }

  fn user<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, GatewayResult<Option<AuthUser>>> {
    Box::pin(async move {
      let url = self.endpoint("auth/v1/user")?;
      let resp = self.request(Method::GET, url, access_token).send().await?;
      if matches!(resp.status().as_u16(), 401 | 403) {
        return Ok(None);
      }
      let resp = check_status(resp, "auth user").await?;
      let body: Value = resp.json().await.map_err(|e| GatewayError::decode(format!("auth user: {e}")))?;
      parse_user(&body).map(Some).ok_or_else(|| GatewayError::decode("auth user: response has no id"))
    })
  }

  fn upload<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a str,
    bytes: Vec<u8>,
    content_type: &'a str,
  ) -> BoxFuture<'a, GatewayResult<String>> {
    Box::pin(async move {
      let path = path.trim_start_matches('/');
      let url = self.endpoint(&format!("storage/v1/object/{bucket}/{path}"))?;
      let resp = self
        .request(Method::POST, url, &self.key)
        .header("Content-Type", content_type)
        .header("x-upsert", "true")
        .body(bytes)
        .send()
        .await?;
      check_status(resp, &format!("upload {bucket}/{path}")).await?;
      self.public_url(bucket, path)
    })
  }

  fn subscribe<'a>(&'a self, table: &'a str) -> BoxFuture<'a, GatewayResult<BoxStream<GatewayResult<ChangeEvent>>>> {
    Box::pin(realtime::subscribe(&self.base, &self.key, table))
  }

  fn probe(&self) -> BoxFuture<'_, GatewayResult<()>> {
    Box::pin(async move {
      let select = Select::from(self.probe_table.as_str()).limit(1);
      self.select(&select).await.map(|_| ())
    })
  }
}
