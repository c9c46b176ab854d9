/* src/server/engine/rust/src/cache.rs */

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered tuple of strings identifying one cached query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
  pub fn new<I, S>(parts: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(parts.into_iter().map(Into::into).collect())
  }

  pub fn parts(&self) -> &[String] {
    &self.0
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]", self.0.join(","))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
  /// Data was fetched.
  Success,
  /// The read succeeded but found nothing; data is `null`.
  Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
  pub data: serde_json::Value,
  pub status: EntryStatus,
}

/// Keyed store of fetched data. One instance per server render; the
/// browser rebuilds its own from the embedded snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryCache {
  entries: BTreeMap<QueryKey, QueryEntry>,
}

/// Serialized form of one cache entry inside the state script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
  pub query_key: QueryKey,
  pub state: QueryEntry,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, key: QueryKey, data: serde_json::Value) {
    self.entries.insert(key, QueryEntry { data, status: EntryStatus::Success });
  }

  /// Record an explicit "no data" result for `key`.
  pub fn set_empty(&mut self, key: QueryKey) {
    self.entries.insert(key, QueryEntry { data: serde_json::Value::Null, status: EntryStatus::Empty });
  }

  pub fn get(&self, key: &QueryKey) -> Option<&QueryEntry> {
    self.entries.get(key)
  }

  pub fn data(&self, key: &QueryKey) -> Option<&serde_json::Value> {
    self.entries.get(key).map(|e| &e.data)
  }

  pub fn contains(&self, key: &QueryKey) -> bool {
    self.entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
    self.entries.keys()
  }

  /// Entries in key order, ready for serialization.
  pub fn dehydrate(&self) -> Vec<DehydratedQuery> {
    self
      .entries
      .iter()
      .map(|(key, entry)| DehydratedQuery { query_key: key.clone(), state: entry.clone() })
      .collect()
  }

  /// Rebuild a cache from dehydrated entries. Later duplicates win.
  pub fn hydrate(queries: Vec<DehydratedQuery>) -> Self {
    let entries = queries.into_iter().map(|q| (q.query_key, q.state)).collect();
    Self { entries }
  }
}

/// Everything the state script carries: the cache plus page payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
  pub queries: Vec<DehydratedQuery>,
  #[serde(default)]
  pub page_data: serde_json::Map<String, serde_json::Value>,
}

impl PageState {
  pub fn new(cache: &QueryCache, page_data: serde_json::Map<String, serde_json::Value>) -> Self {
    Self { queries: cache.dehydrate(), page_data }
  }
}
