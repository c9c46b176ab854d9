/* src/server/engine/rust/src/escape.rs */

use std::fmt::Write;

/// Make serialized JSON safe to embed inside a `<script>` element.
///
/// Walks the JSON text tracking whether the current position is inside a
/// JSON string (handling `\"` and `\\`). Inside strings, `<`, `>`, `&`,
/// U+2028, U+2029 and every other non-ASCII codepoint become `\uXXXX`
/// escapes; codepoints outside the BMP become surrogate pairs. The output is
/// still valid JSON that parses to the same value, and can never contain
/// `</script` or `<!--`.
pub fn escape_script_json(json: &str) -> String {
  let mut out = String::with_capacity(json.len());
  let mut in_string = false;
  let mut chars = json.chars();

  while let Some(ch) = chars.next() {
    if !in_string {
      if ch == '"' {
        in_string = true;
      }
      out.push(ch);
      continue;
    }
    match ch {
      '\\' => {
        out.push(ch);
        if let Some(next) = chars.next() {
          out.push(next);
        }
      }
      '"' => {
        in_string = false;
        out.push(ch);
      }
      '<' | '>' | '&' => push_unit(&mut out, ch as u32),
      c if (c as u32) > 0x7F => {
        let code = c as u32;
        if code > 0xFFFF {
          let adjusted = code - 0x1_0000;
          push_unit(&mut out, (adjusted >> 10) + 0xD800);
          push_unit(&mut out, (adjusted & 0x3FF) + 0xDC00);
        } else {
          push_unit(&mut out, code);
        }
      }
      c => out.push(c),
    }
  }
  out
}

fn push_unit(out: &mut String, unit: u32) {
  let _ = write!(out, "\\u{unit:04x}");
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};

  #[test]
  fn ascii_passthrough() {
    let input = r#"{"name":"Mochi","age":3}"#;
    assert_eq!(escape_script_json(input), input);
  }

  #[test]
  fn closing_script_tag_is_neutralised() {
    let input = json!({"bio": "</script><script>alert(1)</script>"}).to_string();
    let escaped = escape_script_json(&input);
    assert!(!escaped.contains('<'));
    assert!(escaped.contains(r"\u003c/script\u003e"));
  }

  #[test]
  fn escaped_output_parses_to_same_value() {
    let value = json!({"bio": "Loves <b>naps</b> & \"tuna\" 猫 😺", "line": "a\u{2028}b"});
    let escaped = escape_script_json(&value.to_string());
    assert!(escaped.is_ascii());
    let back: Value = serde_json::from_str(&escaped).unwrap();
    assert_eq!(back, value);
  }

  #[test]
  fn surrogate_pair_for_emoji() {
    assert_eq!(escape_script_json(r#"{"e":"😀"}"#), r#"{"e":"\ud83d\ude00"}"#);
  }

  #[test]
  fn preserves_existing_escapes() {
    let input = r#"{"a":"say \"hi\"","b":"back\\slash"}"#;
    assert_eq!(escape_script_json(input), input);
  }
}
