/* src/server/core/rust/src/resolve.rs */

use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::join_all;
use purr_engine::{RouteDescriptor, RouteTable};
use purr_gateway::DataGateway;
use serde_json::Value;

use crate::page::{IdentifierSource, PageRoute};

fn identifier(value: &Value) -> Option<String> {
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

async fn dynamic_paths(
  route: &RouteDescriptor<PageRoute>,
  source: IdentifierSource,
  gateway: &dyn DataGateway,
) -> Vec<String> {
  let pattern = route.pattern.as_str();
  let rows = match gateway.select(&source.select).await {
    Ok(rows) => rows,
    Err(err) => {
      tracing::warn!(route = pattern, table = %source.select.table, error = %err, "identifier listing failed, skipping route");
      return Vec::new();
    }
  };
  let column = source.column();
  rows
    .iter()
    .filter_map(|row| {
      let Some(id) = identifier(&row[column]) else {
        tracing::debug!(route = pattern, column, "row has no usable identifier");
        return None;
      };
      route.pattern.fill(&BTreeMap::from([(source.param.to_string(), id)]))
    })
    .collect()
}

/// Every URL to prerender: static routes verbatim plus one path per
/// identifier of each dynamic route. Sorted and deduplicated.
pub async fn resolve_paths(table: &RouteTable<PageRoute>, gateway: &dyn DataGateway) -> Vec<String> {
  let mut paths = BTreeSet::new();
  let mut listings = Vec::new();

  for route in table.routes() {
    if route.pattern.is_catch_all() {
      continue;
    }
    if !route.pattern.is_dynamic() {
      paths.insert(route.pattern.as_str().to_string());
      continue;
    }
    match route.target.kind.identifier_source() {
      Some(source) => listings.push(dynamic_paths(route, source, gateway)),
      None => tracing::debug!(route = route.pattern.as_str(), "dynamic route without identifier source"),
    }
  }

  for found in join_all(listings).await {
    paths.extend(found);
  }
  paths.into_iter().collect()
}
