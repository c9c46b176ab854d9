/* src/server/core/rust/src/prefetch/tests.rs */

use purr_gateway::{GatewayError, MemoryGateway};
use serde_json::json;

use super::*;
use crate::page::route_table;

fn shelter() -> MemoryGateway {
  MemoryGateway::new()
    .with_table(
      "cats",
      vec![
        json!({"id": 42, "name": "Mochi", "status": "available", "created_at": "2026-03-01"}),
        json!({"id": 7, "name": "Tofu", "status": "available", "created_at": "2026-02-01"}),
      ],
    )
    .with_table(
      "news_posts",
      vec![json!({"id": 1, "slug": "open-house", "title": "Open house", "published": true, "published_at": "2026-04-01"})],
    )
    .with_table("budgets", vec![json!({"category": "vet", "amount": 1000})])
    .with_table("expenses", vec![json!({"category": "vet", "amount": 250})])
}

#[test]
fn classify_agrees_with_route_table() {
  let table = route_table().unwrap();
  for url in [
    "/", "/cats", "/cats/42", "/cats/42/", "/news", "/news/open-house?ref=x", "/transparency", "/donate",
    "/login", "/admin", "/admin/cats", "/admin/cats/7", "/unknown-path", "/cats/1/2",
  ] {
    let (kind, params) = classify(url).unwrap();
    let hit = table.lookup(url).unwrap();
    assert_eq!(kind, hit.route.target.kind, "{url}");
    assert_eq!(params, hit.params, "{url}");
  }
  assert!(classify("cats").is_none());
}

#[tokio::test]
async fn detail_found() {
  let gw = shelter();
  let mut cache = QueryCache::new();
  let report = prefetch("/cats/42", &gw, &mut cache).await;
  assert_eq!(report.kind, PageKind::CatDetail);
  assert_eq!(cache.data(&QueryKey::new(["cat", "42"])).unwrap()["name"], "Mochi");
  assert_eq!(report.page_data["cat"]["id"], 42);
  assert!(!report.primary_missing(&cache));
}

#[tokio::test]
async fn detail_missing_is_empty_not_error() {
  let gw = shelter();
  let mut cache = QueryCache::new();
  let report = prefetch("/cats/999", &gw, &mut cache).await;
  let key = QueryKey::new(["cat", "999"]);
  assert_eq!(report.status(&cache, &key), SlotStatus::Empty);
  assert_eq!(cache.data(&key), Some(&Value::Null));
  assert!(report.page_data.is_empty());
  assert!(report.primary_missing(&cache));
}

#[tokio::test]
async fn transport_failure_leaves_key_absent() {
  let gw = shelter();
  gw.fail_table("news_posts", GatewayError::transport("connection reset"));
  let mut cache = QueryCache::new();
  let report = prefetch("/", &gw, &mut cache).await;
  assert_eq!(report.status(&cache, &QueryKey::new(["news", "latest"])), SlotStatus::Unavailable);
  assert!(!cache.contains(&QueryKey::new(["news", "latest"])));
  let featured = cache.data(&QueryKey::new(["cats", "featured"])).unwrap();
  assert_eq!(featured[0]["name"], "Mochi");
  assert_eq!(featured.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn transparency_derives_rollup() {
  let gw = shelter();
  let mut cache = QueryCache::new();
  let report = prefetch("/transparency", &gw, &mut cache).await;
  let rollup = &report.page_data["rollup"];
  assert_eq!(rollup["total_remaining"], 750);
  assert_eq!(rollup["categories"][0]["percent_used"], 25.0);
}

#[tokio::test]
async fn transparency_without_expenses_has_no_rollup() {
  let gw = shelter();
  gw.fail_table("expenses", GatewayError::status(500, "boom"));
  let mut cache = QueryCache::new();
  let report = prefetch("/transparency", &gw, &mut cache).await;
  assert!(!report.page_data.contains_key("rollup"));
  assert!(cache.contains(&QueryKey::new(["budgets"])));
}

#[tokio::test]
async fn static_pages_read_nothing() {
  let gw = MemoryGateway::new();
  gw.fail_table("cats", GatewayError::transport("unused"));
  let mut cache = QueryCache::new();
  let report = prefetch("/donate", &gw, &mut cache).await;
  assert!(report.requirements.is_empty());
  assert!(cache.is_empty());
}
