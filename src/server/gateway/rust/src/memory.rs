/* src/server/gateway/rust/src/memory.rs */

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::query::matches_filters;
use crate::{
  AuthUser, BoxFuture, BoxStream, ChangeEvent, ChangeKind, DataGateway, Filter, GatewayError,
  GatewayMode, GatewayResult, Select,
};

const CHANGE_CAPACITY: usize = 256;

/// Fixture file layout for offline builds.
#[derive(Debug, Default, Deserialize)]
pub struct Fixtures {
  #[serde(default)]
  pub tables: BTreeMap<String, Vec<Value>>,
  /// Access token to user.
  #[serde(default)]
  pub users: BTreeMap<String, AuthUser>,
}

/// In-process backend. Tables are plain JSON rows; failures can be injected
/// per table to exercise degraded paths.
pub struct MemoryGateway {
  tables: RwLock<BTreeMap<String, Vec<Value>>>,
  users: RwLock<BTreeMap<String, AuthUser>>,
  failures: RwLock<BTreeMap<String, GatewayError>>,
  objects: RwLock<BTreeMap<String, (String, Vec<u8>)>>,
  changes: broadcast::Sender<ChangeEvent>,
  probe_table: String,
}

impl Default for MemoryGateway {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryGateway {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    Self {
      tables: RwLock::default(),
      users: RwLock::default(),
      failures: RwLock::default(),
      objects: RwLock::default(),
      changes,
      probe_table: crate::config::DEFAULT_PROBE_TABLE.to_string(),
    }
  }

  pub fn from_fixtures(fixtures: Fixtures) -> Self {
    let gw = Self::new();
    for (table, rows) in fixtures.tables {
      gw.set_table(&table, rows);
    }
    for (token, user) in fixtures.users {
      gw.add_user(&token, user);
    }
    gw
  }

  /// Parse a fixture document: `{"tables": {...}, "users": {...}}`.
  pub fn from_json(json: &str) -> GatewayResult<Self> {
    let fixtures: Fixtures =
      serde_json::from_str(json).map_err(|e| GatewayError::decode(format!("invalid fixtures: {e}")))?;
    Ok(Self::from_fixtures(fixtures))
  }

  pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
    self.set_table(table, rows);
    self
  }

  pub fn set_table(&self, table: &str, rows: Vec<Value>) {
    self.tables.write().unwrap_or_else(PoisonError::into_inner).insert(table.to_string(), rows);
  }

  pub fn add_user(&self, token: &str, user: AuthUser) {
    self.users.write().unwrap_or_else(PoisonError::into_inner).insert(token.to_string(), user);
  }

  /// Make every operation touching `table` fail with `err`.
  pub fn fail_table(&self, table: &str, err: GatewayError) {
    self.failures.write().unwrap_or_else(PoisonError::into_inner).insert(table.to_string(), err);
  }

  pub fn clear_failure(&self, table: &str) {
    self.failures.write().unwrap_or_else(PoisonError::into_inner).remove(table);
  }

  pub fn rows(&self, table: &str) -> Vec<Value> {
    self.tables.read().unwrap_or_else(PoisonError::into_inner).get(table).cloned().unwrap_or_default()
  }

  pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
    let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
    objects.get(&format!("{bucket}/{path}")).cloned()
  }

  fn check(&self, table: &str) -> GatewayResult<()> {
    match self.failures.read().unwrap_or_else(PoisonError::into_inner).get(table) {
      Some(err) => Err(err.clone()),
      None => Ok(()),
    }
  }

  fn emit(&self, table: &str, kind: ChangeKind, record: Value, old_record: Value) {
    // No receivers is fine.
    let _ = self.changes.send(ChangeEvent { table: table.to_string(), kind, record, old_record });
  }

  fn do_select(&self, select: &Select) -> GatewayResult<Vec<Value>> {
    self.check(&select.table)?;
    let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
    Ok(tables.get(&select.table).map(|rows| select.apply(rows)).unwrap_or_default())
  }

  fn do_insert(&self, table: &str, rows: Vec<Value>) -> GatewayResult<Vec<Value>> {
    self.check(table)?;
    let mut inserted = Vec::with_capacity(rows.len());
    {
      let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
      let existing = tables.entry(table.to_string()).or_default();
      let mut next_id = existing.iter().filter_map(|r| r["id"].as_u64()).max().unwrap_or(0) + 1;
      for mut row in rows {
        let Some(obj) = row.as_object_mut() else {
          return Err(GatewayError::status(400, format!("insert {table}: rows must be objects")));
        };
        if !obj.contains_key("id") {
          obj.insert("id".into(), Value::from(next_id));
          next_id += 1;
        }
        inserted.push(row);
      }
      existing.extend(inserted.iter().cloned());
    }
    for row in &inserted {
      self.emit(table, ChangeKind::Insert, row.clone(), Value::Null);
    }
    Ok(inserted)
  }

  fn do_update(&self, table: &str, filters: &[Filter], patch: &Value) -> GatewayResult<Vec<Value>> {
    self.check(table)?;
    let Some(patch) = patch.as_object() else {
      return Err(GatewayError::status(400, format!("update {table}: patch must be an object")));
    };
    let mut changed = Vec::new();
    {
      let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
      for row in tables.entry(table.to_string()).or_default().iter_mut() {
        if !matches_filters(row, filters) {
          continue;
        }
        let old = row.clone();
        if let Some(obj) = row.as_object_mut() {
          for (k, v) in patch {
            obj.insert(k.clone(), v.clone());
          }
        }
        changed.push((row.clone(), old));
      }
    }
    for (new, old) in &changed {
      self.emit(table, ChangeKind::Update, new.clone(), old.clone());
    }
    Ok(changed.into_iter().map(|(new, _)| new).collect())
  }

  fn do_delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<Vec<Value>> {
    self.check(table)?;
    if filters.is_empty() {
      return Err(GatewayError::config(format!("refusing to delete from {table} without filters")));
    }
    let removed: Vec<Value> = {
      let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
      let rows = tables.entry(table.to_string()).or_default();
      let (removed, kept): (Vec<Value>, Vec<Value>) = std::mem::take(rows).into_iter().partition(|r| matches_filters(r, filters));
      *rows = kept;
      removed
    };
    for row in &removed {
      self.emit(table, ChangeKind::Delete, Value::Null, row.clone());
    }
    Ok(removed)
  }
}

impl DataGateway for MemoryGateway {
  fn mode(&self) -> GatewayMode {
    GatewayMode::Memory
  }

  fn select<'a>(&'a self, select: &'a Select) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move { self.do_select(select) })
  }

  fn insert<'a>(&'a self, table: &'a str, rows: Vec<Value>) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move { self.do_insert(table, rows) })
  }

  fn update<'a>(
    &'a self,
    table: &'a str,
    filters: &'a [Filter],
    patch: Value,
  ) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move { self.do_update(table, filters, &patch) })
  }

  fn delete<'a>(&'a self, table: &'a str, filters: &'a [Filter]) -> BoxFuture<'a, GatewayResult<Vec<Value>>> {
    Box::pin(async move { self.do_delete(table, filters) })
  }

  fn user<'a>(&'a self, access_token: &'a str) -> BoxFuture<'a, GatewayResult<Option<AuthUser>>> {
    Box::pin(async move {
      self.check("auth")?;
      Ok(self.users.read().unwrap_or_else(PoisonError::into_inner).get(access_token).cloned())
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
      self.check("storage")?;
      let path = path.trim_start_matches('/');
      self
        .objects
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(format!("{bucket}/{path}"), (content_type.to_string(), bytes));
      Ok(format!("memory://storage/{bucket}/{path}"))
    })
  }

  fn subscribe<'a>(&'a self, table: &'a str) -> BoxFuture<'a, GatewayResult<BoxStream<GatewayResult<ChangeEvent>>>> {
    Box::pin(async move {
      self.check(table)?;
      let table = table.to_string();
      let stream = BroadcastStream::new(self.changes.subscribe()).filter_map(move |item| {
        let item = match item {
          Ok(change) if change.table == table => Some(Ok(change)),
          Ok(_) => None,
          Err(e) => Some(Err(GatewayError::transport(format!("change feed lagged: {e}")))),
        };
        std::future::ready(item)
      });
      let stream: BoxStream<GatewayResult<ChangeEvent>> = Box::pin(stream);
      Ok(stream)
    })
  }

  fn probe(&self) -> BoxFuture<'_, GatewayResult<()>> {
    Box::pin(async move { self.check(&self.probe_table) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ErrorKind;
  use serde_json::json;

  fn shelter() -> MemoryGateway {
    MemoryGateway::new().with_table(
      "cats",
      vec![
        json!({"id": 1, "name": "Tofu", "status": "available"}),
        json!({"id": 2, "name": "Mochi", "status": "adopted"}),
      ],
    )
  }

  #[tokio::test]
  async fn select_applies_query() {
    let gw = shelter();
    let rows = gw.select(&Select::from("cats").eq("id", "2")).await.unwrap();
    assert_eq!(rows, vec![json!({"id": 2, "name": "Mochi", "status": "adopted"})]);
    assert!(gw.select(&Select::from("unknown")).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn injected_failures() {
    let gw = shelter();
    gw.fail_table("cats", GatewayError::transport("connection reset"));
    let err = gw.select(&Select::from("cats")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(gw.probe().await.is_err());
    gw.clear_failure("cats");
    assert!(gw.probe().await.is_ok());
  }

  #[tokio::test]
  async fn writes_emit_changes() {
    let gw = shelter();
    let mut feed = gw.subscribe("cats").await.unwrap();

    let inserted = gw.insert("cats", vec![json!({"name": "Bean"})]).await.unwrap();
    assert_eq!(inserted[0]["id"], 3);
    let filters = [Filter::Eq("name".into(), json!("Tofu"))];
    let updated = gw.update("cats", &filters, json!({"status": "adopted"})).await.unwrap();
    assert_eq!(updated[0]["status"], "adopted");
    let removed = gw.delete("cats", &filters).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(gw.rows("cats").len(), 2);

    let kinds: Vec<ChangeKind> = [
      feed.next().await.unwrap().unwrap(),
      feed.next().await.unwrap().unwrap(),
      feed.next().await.unwrap().unwrap(),
    ]
    .iter()
    .map(|c| c.kind)
    .collect();
    assert_eq!(kinds, vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]);
  }

  #[tokio::test]
  async fn users_and_uploads() {
    let gw = MemoryGateway::from_json(
      r#"{"users": {"tok-1": {"id": "u-1", "role": "admin"}}, "tables": {"cats": []}}"#,
    )
    .unwrap();
    assert_eq!(gw.user("tok-1").await.unwrap().unwrap().role.as_deref(), Some("admin"));
    assert_eq!(gw.user("nope").await.unwrap(), None);

    let url = gw.upload("cat-photos", "tofu.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
    assert_eq!(url, "memory://storage/cat-photos/tofu.jpg");
    assert_eq!(gw.object("cat-photos", "tofu.jpg"), Some(("image/jpeg".into(), vec![1, 2, 3])));
  }

  #[test]
  fn bad_fixtures() {
    let err = MemoryGateway::from_json("{\"tables\": 3}").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Decode);
  }
}
