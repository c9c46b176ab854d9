/* src/server/gateway/rust/src/query.rs */

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  Eq(String, Value),
  In(String, Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub column: String,
  pub ascending: bool,
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
  pub table: String,
  /// Empty means every column.
  pub columns: Vec<String>,
  pub filters: Vec<Filter>,
  pub order: Option<Order>,
  pub limit: Option<usize>,
}

impl Select {
  pub fn from(table: impl Into<String>) -> Self {
    Self { table: table.into(), columns: Vec::new(), filters: Vec::new(), order: None, limit: None }
  }

  pub fn columns<I, S>(mut self, columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.columns = columns.into_iter().map(Into::into).collect();
    self
  }

  pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
    self.filters.push(Filter::Eq(column.into(), value.into()));
    self
  }

  pub fn is_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
    self.filters.push(Filter::In(column.into(), values));
    self
  }

  pub fn order_asc(mut self, column: impl Into<String>) -> Self {
    self.order = Some(Order { column: column.into(), ascending: true });
    self
  }

  pub fn order_desc(mut self, column: impl Into<String>) -> Self {
    self.order = Some(Order { column: column.into(), ascending: false });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Query-string pairs in the platform's REST dialect.
  pub fn to_query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let columns = if self.columns.is_empty() { "*".to_string() } else { self.columns.join(",") };
    pairs.push(("select".to_string(), columns));
    pairs.extend(filter_pairs(&self.filters));
    if let Some(order) = &self.order {
      let dir = if order.ascending { "asc" } else { "desc" };
      pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
    }
    if let Some(limit) = self.limit {
      pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
  }

  /// Apply this read to in-memory rows.
  pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> =
      rows.iter().filter(|row| matches_filters(row, &self.filters)).cloned().collect();
    if let Some(order) = &self.order {
      out.sort_by(|a, b| {
        let ord = compare_values(&a[&order.column], &b[&order.column]);
        if order.ascending { ord } else { ord.reverse() }
      });
    }
    if let Some(limit) = self.limit {
      out.truncate(limit);
    }
    if !self.columns.is_empty() {
      out = out.into_iter().map(|row| project(&row, &self.columns)).collect();
    }
    out
  }
}

pub fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
  filters
    .iter()
    .map(|f| match f {
      Filter::Eq(col, v) => (col.clone(), format!("eq.{}", literal(v))),
      Filter::In(col, vs) => {
        let items: Vec<String> = vs.iter().map(|v| quote_list_item(&literal(v))).collect();
        (col.clone(), format!("in.({})", items.join(",")))
      }
    })
    .collect()
}

fn literal(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => "null".to_string(),
    other => other.to_string(),
  }
}

fn quote_list_item(item: &str) -> String {
  if item.contains([',', '(', ')', '"', ' ']) {
    format!("\"{}\"", item.replace('"', "\\\""))
  } else {
    item.to_string()
  }
}

pub fn matches_filters(row: &Value, filters: &[Filter]) -> bool {
  filters.iter().all(|f| match f {
    Filter::Eq(col, v) => loose_eq(&row[col.as_str()], v),
    Filter::In(col, vs) => vs.iter().any(|v| loose_eq(&row[col.as_str()], v)),
  })
}

/// Equality that treats `42` and `"42"` alike, the way the REST dialect
/// coerces query-string literals.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
  if a == b {
    return true;
  }
  match (a, b) {
    (Value::Null, _) | (_, Value::Null) => false,
    (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
    _ => literal(a) == literal(b),
  }
}

/// Nulls sort last; mixed types order by kind.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
  match (a, b) {
    (Value::Null, Value::Null) => Ordering::Equal,
    (Value::Null, _) => Ordering::Greater,
    (_, Value::Null) => Ordering::Less,
    (Value::Number(x), Value::Number(y)) => {
      x.as_f64().unwrap_or(0.0).partial_cmp(&y.as_f64().unwrap_or(0.0)).unwrap_or(Ordering::Equal)
    }
    (Value::String(x), Value::String(y)) => x.cmp(y),
    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
    _ => kind_rank(a).cmp(&kind_rank(b)),
  }
}

fn kind_rank(value: &Value) -> u8 {
  match value {
    Value::Bool(_) => 0,
    Value::Number(_) => 1,
    Value::String(_) => 2,
    Value::Array(_) => 3,
    Value::Object(_) => 4,
    Value::Null => 5,
  }
}

fn project(row: &Value, columns: &[String]) -> Value {
  let Some(obj) = row.as_object() else {
    return row.clone();
  };
  let picked = columns
    .iter()
    .filter_map(|c| obj.get(c).map(|v| (c.clone(), v.clone())))
    .collect::<serde_json::Map<_, _>>();
  Value::Object(picked)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn query_pairs() {
    let select = Select::from("cats")
      .columns(["id", "name"])
      .eq("status", "available")
      .eq("featured", true)
      .order_desc("created_at")
      .limit(6);
    assert_eq!(
      select.to_query_pairs(),
      vec![
        ("select".to_string(), "id,name".to_string()),
        ("status".to_string(), "eq.available".to_string()),
        ("featured".to_string(), "eq.true".to_string()),
        ("order".to_string(), "created_at.desc".to_string()),
        ("limit".to_string(), "6".to_string()),
      ]
    );
  }

  #[test]
  fn in_filter_quotes_awkward_items() {
    let pairs = filter_pairs(&[Filter::In("name".into(), vec![json!("Tofu"), json!("Mr. Whiskers, Jr")])]);
    assert_eq!(pairs, vec![("name".to_string(), r#"in.(Tofu,"Mr. Whiskers, Jr")"#.to_string())]);
  }

  #[test]
  fn default_select_is_star() {
    assert_eq!(Select::from("budgets").to_query_pairs(), vec![("select".into(), "*".into())]);
  }

  #[test]
  fn apply_filters_orders_and_limits() {
    let rows = vec![
      json!({"id": 1, "name": "Tofu", "status": "available"}),
      json!({"id": 2, "name": "Mochi", "status": "adopted"}),
      json!({"id": 3, "name": "Bean", "status": "available"}),
      json!({"id": 4, "name": "Apricot", "status": "available"}),
    ];
    let out = Select::from("cats")
      .columns(["name"])
      .eq("status", "available")
      .order_asc("name")
      .limit(2)
      .apply(&rows);
    assert_eq!(out, vec![json!({"name": "Apricot"}), json!({"name": "Bean"})]);
  }

  #[test]
  fn loose_equality() {
    assert!(loose_eq(&json!(42), &json!("42")));
    assert!(loose_eq(&json!(true), &json!("true")));
    assert!(!loose_eq(&json!(null), &json!("null")));
    assert!(!loose_eq(&json!(4), &json!("42")));
  }

  #[test]
  fn nulls_sort_last() {
    let mut values = vec![json!(null), json!(3), json!(1)];
    values.sort_by(compare_values);
    assert_eq!(values, vec![json!(1), json!(3), json!(null)]);
  }
}
