/* src/server/engine/wasm/src/lib.rs */

use purr_engine::{DocumentIds, Hydration, QueryKey};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

fn error_json(message: impl std::fmt::Display) -> String {
  json!({ "error": message.to_string() }).to_string()
}

fn hydrate(html: &str) -> Result<Hydration, String> {
  Hydration::from_document(html, &DocumentIds::default()).map_err(|e| e.to_string())
}

/// Parse the server-rendered document and return
/// `{"queries":[...],"pageData":{...},"pagePayload":...}`, or
/// `{"error":"..."}` when the document cannot be hydrated.
#[wasm_bindgen(js_name = hydrateState)]
pub fn hydrate_state(html: &str) -> String {
  match hydrate(html) {
    Ok(h) => json!({
      "queries": h.cache.dehydrate(),
      "pageData": h.page_data,
      "pagePayload": h.page_payload,
    })
    .to_string(),
    Err(e) => error_json(e),
  }
}

/// Data cached under `key_json` (a JSON array of strings), or `null`.
#[wasm_bindgen(js_name = queryData)]
pub fn query_data(html: &str, key_json: &str) -> String {
  let parts: Vec<String> = match serde_json::from_str(key_json) {
    Ok(parts) => parts,
    Err(e) => return error_json(format!("invalid query key: {e}")),
  };
  match hydrate(html) {
    Ok(h) => h.cache.data(&QueryKey::new(parts)).cloned().unwrap_or(Value::Null).to_string(),
    Err(e) => error_json(e),
  }
}

#[wasm_bindgen(js_name = escapeScriptJson)]
pub fn escape_script_json(json: &str) -> String {
  purr_engine::escape_script_json(json)
}

#[cfg(test)]
mod tests {
  use super::*;
  use purr_engine::{DEFAULT_SHELL, DocumentConfig, DocumentParts, PageState, QueryCache, assemble};

  fn document() -> String {
    let mut cache = QueryCache::new();
    cache.set(QueryKey::new(["cat", "42"]), json!({"id": "42", "name": "Mochi"}));
    let state = PageState::new(&cache, serde_json::Map::new());
    assemble(
      DEFAULT_SHELL,
      &DocumentConfig::default(),
      &DocumentParts { body: "", head: &[], state: &state },
    )
    .unwrap()
  }

  #[test]
  fn hydrate_state_lists_queries() {
    let out: Value = serde_json::from_str(&hydrate_state(&document())).unwrap();
    assert_eq!(out["queries"][0]["queryKey"], json!(["cat", "42"]));
    assert_eq!(out["queries"][0]["state"]["status"], "success");
    assert_eq!(out["pagePayload"], Value::Null);
  }

  #[test]
  fn query_data_by_key() {
    let html = document();
    assert_eq!(query_data(&html, r#"["cat","42"]"#), r#"{"id":"42","name":"Mochi"}"#);
    assert_eq!(query_data(&html, r#"["cat","7"]"#), "null");
    assert!(query_data(&html, "nope").contains("invalid query key"));
  }

  #[test]
  fn errors_are_json() {
    let out: Value = serde_json::from_str(&hydrate_state("<html></html>")).unwrap();
    assert!(out["error"].as_str().unwrap().contains("root node"));
  }
}
