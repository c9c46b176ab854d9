/* src/server/engine/rust/src/hydrate.rs */

use std::fmt;

use serde_json::{Map, Value};

use crate::cache::{PageState, QueryCache};
use crate::document::DocumentIds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrateError {
  MissingRoot(String),
  MissingState(String),
  InvalidState(String),
}

impl fmt::Display for HydrateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingRoot(id) => write!(f, "root node #{id} not found in document"),
      Self::MissingState(id) => write!(f, "state script #{id} not found in document"),
      Self::InvalidState(msg) => write!(f, "state script is not valid page state: {msg}"),
    }
  }
}

impl std::error::Error for HydrateError {}

/// Client-side view of a server-rendered page: a cache rebuilt with the
/// same keys, plus the page payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydration {
  pub cache: QueryCache,
  pub page_data: Map<String, Value>,
  /// Contents of the separate page-data script, when present.
  pub page_payload: Option<Value>,
}

/// Body of `<script id="{id}" ...>...</script>`, attributes in any order.
pub fn extract_script<'a>(html: &'a str, id: &str) -> Option<&'a str> {
  let needle = format!(r#"id="{id}""#);
  let mut from = 0;
  while let Some(rel) = html[from..].find("<script") {
    let start = from + rel;
    let tag_end = start + html[start..].find('>')?;
    let open_tag = &html[start..tag_end];
    if open_tag.contains(&needle) {
      let body_start = tag_end + 1;
      let body_end = body_start + html[body_start..].find("</script>")?;
      return Some(&html[body_start..body_end]);
    }
    from = tag_end;
  }
  None
}

impl Hydration {
  /// Rebuild from a full document; the root node must be present.
  pub fn from_document(html: &str, ids: &DocumentIds) -> Result<Self, HydrateError> {
    if !html.contains(&format!(r#"id="{}""#, ids.root_id)) {
      return Err(HydrateError::MissingRoot(ids.root_id.clone()));
    }
    let state = extract_script(html, &ids.state_id)
      .ok_or_else(|| HydrateError::MissingState(ids.state_id.clone()))?;
    let mut hydration = Self::from_state_json(state)?;
    if let Some(payload) = extract_script(html, &ids.page_data_id) {
      let value: Value =
        serde_json::from_str(payload).map_err(|e| HydrateError::InvalidState(e.to_string()))?;
      hydration.page_payload = Some(value);
    }
    Ok(hydration)
  }

  /// Rebuild from the state script's text. Escaped characters decode
  /// through ordinary JSON parsing.
  pub fn from_state_json(json: &str) -> Result<Self, HydrateError> {
    let state: PageState =
      serde_json::from_str(json).map_err(|e| HydrateError::InvalidState(e.to_string()))?;
    Ok(Self { cache: QueryCache::hydrate(state.queries), page_data: state.page_data, page_payload: None })
  }
}
