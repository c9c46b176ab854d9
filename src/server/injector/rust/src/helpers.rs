/* src/server/injector/rust/src/helpers.rs */

use serde_json::Value;

pub(crate) fn resolve<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
  let mut current = data;
  for key in path.split('.') {
    current = match current {
      Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
      other => other.get(key)?,
    };
  }
  Some(current)
}

pub(crate) fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(arr) => !arr.is_empty(),
    Value::Object(_) => true,
  }
}

pub(crate) fn stringify(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Escape text for HTML element content and double-quoted attribute values.
/// NUL is dropped so it can never forge an attribute marker.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      '\0' => {}
      c => out.push(c),
    }
  }
  out
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_segment(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for byte in value.bytes() {
    if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
      out.push(byte as char);
    } else {
      out.push_str(&format!("%{byte:02X}"));
    }
  }
  out
}

// HTML boolean attributes: truthy renders `attr=""`, falsy omits the attribute.
const HTML_BOOLEAN_ATTRS: &[&str] = &[
  "allowfullscreen",
  "async",
  "autofocus",
  "autoplay",
  "checked",
  "controls",
  "default",
  "defer",
  "disabled",
  "hidden",
  "loop",
  "multiple",
  "muted",
  "novalidate",
  "open",
  "readonly",
  "required",
  "selected",
];

pub(crate) fn is_html_boolean_attr(name: &str) -> bool {
  HTML_BOOLEAN_ATTRS.contains(&name)
}
