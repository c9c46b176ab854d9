/* src/server/core/rust/src/prefetch.rs */

use std::collections::BTreeMap;

use futures_util::future::join_all;
use purr_engine::route::{decode_segment, path_segments};
use purr_engine::{EntryStatus, QueryCache, QueryKey};
use purr_gateway::DataGateway;
use serde_json::{Map, Value};

use crate::insights::transparency_rollup;
use crate::page::{DataRequirement, PageKind, Shape};

pub type Params = BTreeMap<String, String>;

/// Identify the page for a URL by its path segments alone.
pub fn classify(url: &str) -> Option<(PageKind, Params)> {
  if !url.starts_with('/') {
    return None;
  }
  let segments = path_segments(url);
  let one = |name: &str, value: &str| Params::from([(name.to_string(), decode_segment(value))]);
  let classified = match segments.as_slice() {
    [] => (PageKind::Home, Params::new()),
    ["cats"] => (PageKind::CatList, Params::new()),
    ["cats", id] => (PageKind::CatDetail, one("id", *id)),
    ["news"] => (PageKind::NewsList, Params::new()),
    ["news", slug] => (PageKind::NewsArticle, one("slug", *slug)),
    ["transparency"] => (PageKind::Transparency, Params::new()),
    ["donate"] => (PageKind::Donate, Params::new()),
    ["login"] => (PageKind::SignIn, Params::new()),
    ["admin"] => (PageKind::AdminDashboard, Params::new()),
    ["admin", "cats"] => (PageKind::AdminCats, Params::new()),
    rest => (PageKind::NotFound, Params::from([("*".to_string(), rest.join("/"))])),
  };
  Some(classified)
}

/// How one requirement settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
  Success,
  Empty,
  /// The read failed; the key is absent from the cache.
  Unavailable,
}

impl SlotStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Empty => "empty",
      Self::Unavailable => "unavailable",
    }
  }
}

#[derive(Debug, Clone)]
pub struct PrefetchReport {
  pub kind: PageKind,
  pub params: Params,
  pub requirements: Vec<DataRequirement>,
  pub page_data: Map<String, Value>,
}

impl PrefetchReport {
  pub fn status(&self, cache: &QueryCache, key: &QueryKey) -> SlotStatus {
    match cache.get(key).map(|e| e.status) {
      Some(EntryStatus::Success) => SlotStatus::Success,
      Some(EntryStatus::Empty) => SlotStatus::Empty,
      None => SlotStatus::Unavailable,
    }
  }

  /// True when a single-record page found no record.
  pub fn primary_missing(&self, cache: &QueryCache) -> bool {
    self
      .requirements
      .iter()
      .any(|r| r.shape == Shape::One && self.status(cache, &r.key) == SlotStatus::Empty)
  }
}

/// Run every read the page for `url` needs, concurrently, and store the
/// results in `cache`. Failed reads are logged and leave their key absent.
pub async fn prefetch(url: &str, gateway: &dyn DataGateway, cache: &mut QueryCache) -> PrefetchReport {
  let (kind, params) = classify(url).unwrap_or((PageKind::NotFound, Params::new()));
  let requirements = kind.requirements(&params);

  let results = join_all(requirements.iter().map(|req| gateway.select(&req.select))).await;

  let mut page_data = Map::new();
  for (req, result) in requirements.iter().zip(results) {
    match result {
      Ok(rows) => match req.shape {
        Shape::Many => cache.set(req.key.clone(), Value::Array(rows)),
        Shape::One => match rows.into_iter().next() {
          Some(row) => {
            if let Some(field) = req.page_data {
              page_data.insert(field.to_string(), row.clone());
            }
            cache.set(req.key.clone(), row);
          }
          None => cache.set_empty(req.key.clone()),
        },
      },
      Err(err) => {
        tracing::warn!(url, key = %req.key, table = %req.select.table, error = %err, "prefetch read failed");
      }
    }
  }

  if kind == PageKind::Transparency {
    let rows = |key: &[&str]| cache.data(&QueryKey::new(key.iter().copied())).and_then(Value::as_array);
    if let (Some(budgets), Some(expenses)) = (rows(&["budgets"]), rows(&["expenses"])) {
      let rollup = transparency_rollup(budgets, expenses);
      if let Ok(value) = serde_json::to_value(rollup) {
        page_data.insert("rollup".to_string(), value);
      }
    }
  }

  PrefetchReport { kind, params, requirements, page_data }
}

#[cfg(test)]
mod tests;
