/* src/server/engine/rust/src/document.rs */

//! Final HTML document assembly: shell + head tags + rendered body + state
//! scripts. Pure string work, no I/O.

use std::fmt;

use purr_injector::{HeadTag, escape_html};
use serde::{Deserialize, Serialize};

use crate::cache::PageState;
use crate::escape::escape_script_json;

pub const DEFAULT_SHELL: &str = concat!(
  "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
  "<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">",
  "</head><body><div id=\"__purr\"></div></body></html>"
);

/// Element ids shared by the renderer and the hydration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIds {
  pub root_id: String,
  pub state_id: String,
  pub page_data_id: String,
}

impl Default for DocumentIds {
  fn default() -> Self {
    Self {
      root_id: "__purr".to_string(),
      state_id: "__PURR_STATE__".to_string(),
      page_data_id: "__PURR_PAGE__".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
  pub ids: DocumentIds,
  pub lang: String,
  pub default_title: String,
  /// Stylesheet hrefs, in order.
  pub stylesheets: Vec<String>,
  /// Module script srcs, in order (the client bootstrap).
  pub scripts: Vec<String>,
}

impl Default for DocumentConfig {
  fn default() -> Self {
    Self {
      ids: DocumentIds::default(),
      lang: "en".to_string(),
      default_title: "Purrhaven Cat Rescue".to_string(),
      stylesheets: Vec::new(),
      scripts: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
  /// The shell lacks a required anchor such as `</head>` or the root node.
  MissingAnchor(String),
  Serialize(String),
}

impl fmt::Display for DocumentError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingAnchor(anchor) => write!(f, "document shell is missing `{anchor}`"),
      Self::Serialize(msg) => write!(f, "failed to serialize page state: {msg}"),
    }
  }
}

impl std::error::Error for DocumentError {}

/// Inputs produced by one render.
pub struct DocumentParts<'a> {
  pub body: &'a str,
  pub head: &'a [HeadTag],
  pub state: &'a PageState,
}

/// Collapse head tags: the last title wins, the last meta per name wins,
/// links are kept in order without exact duplicates.
pub fn merge_head(tags: &[HeadTag]) -> Vec<HeadTag> {
  let mut merged: Vec<HeadTag> = Vec::with_capacity(tags.len());
  for tag in tags {
    let existing = merged.iter().position(|m| match (m, tag) {
      (HeadTag::Title(_), HeadTag::Title(_)) => true,
      (HeadTag::Meta { name: a, .. }, HeadTag::Meta { name: b, .. }) => a == b,
      (a @ HeadTag::Link { .. }, b @ HeadTag::Link { .. }) => a == b,
      _ => false,
    });
    match existing {
      Some(i) => merged[i] = tag.clone(),
      None => merged.push(tag.clone()),
    }
  }
  merged
}

fn head_html(config: &DocumentConfig, tags: &[HeadTag]) -> String {
  let merged = merge_head(tags);
  let mut out = String::new();
  if !merged.iter().any(|t| matches!(t, HeadTag::Title(_))) {
    out.push_str(&HeadTag::Title(config.default_title.clone()).to_html());
  }
  for tag in &merged {
    out.push_str(&tag.to_html());
  }
  for href in &config.stylesheets {
    out.push_str(&format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)));
  }
  out
}

/// Build a JSON `<script>` element with `<` and friends escaped.
pub fn data_script(id: &str, json: &str) -> String {
  format!(
    r#"<script id="{}" type="application/json">{}</script>"#,
    escape_html(id),
    escape_script_json(json)
  )
}

/// Set `<html lang="...">`, replacing an existing attribute-free `<html>`.
pub fn inject_html_lang(html: &str, lang: &str) -> String {
  if html.contains("<html lang=") {
    return html.to_string();
  }
  html.replacen("<html", &format!("<html lang=\"{}\"", escape_html(lang)), 1)
}

/// Insert `fragment` after `<meta charset="utf-8">`, or before `</head>`
/// when the shell has no charset declaration.
pub fn inject_head(html: &str, fragment: &str) -> Result<String, DocumentError> {
  let charset = r#"<meta charset="utf-8">"#;
  let insert_at = match html.find(charset) {
    Some(pos) => pos + charset.len(),
    None => html.find("</head>").ok_or_else(|| DocumentError::MissingAnchor("</head>".into()))?,
  };
  let mut out = String::with_capacity(html.len() + fragment.len());
  out.push_str(&html[..insert_at]);
  out.push_str(fragment);
  out.push_str(&html[insert_at..]);
  Ok(out)
}

/// Insert `fragment` before the last `</body>`, appending when absent.
pub fn inject_before_body_end(html: &str, fragment: &str) -> String {
  match html.rfind("</body>") {
    Some(pos) => {
      let mut out = String::with_capacity(html.len() + fragment.len());
      out.push_str(&html[..pos]);
      out.push_str(fragment);
      out.push_str(&html[pos..]);
      out
    }
    None => format!("{html}{fragment}"),
  }
}

/// Assemble the complete document.
pub fn assemble(
  shell: &str,
  config: &DocumentConfig,
  parts: &DocumentParts<'_>,
) -> Result<String, DocumentError> {
  let root_anchor = format!(r#"<div id="{}"></div>"#, config.ids.root_id);
  let Some(root_pos) = shell.find(&root_anchor) else {
    return Err(DocumentError::MissingAnchor(root_anchor));
  };

  let mut html = String::with_capacity(shell.len() + parts.body.len() + 256);
  html.push_str(&shell[..root_pos]);
  html.push_str(&format!(r#"<div id="{}">"#, config.ids.root_id));
  html.push_str(parts.body);
  html.push_str("</div>");
  html.push_str(&shell[root_pos + root_anchor.len()..]);

  html = inject_html_lang(&html, &config.lang);
  html = inject_head(&html, &head_html(config, parts.head))?;

  let state_json =
    serde_json::to_string(parts.state).map_err(|e| DocumentError::Serialize(e.to_string()))?;
  let mut scripts = data_script(&config.ids.state_id, &state_json);
  if !parts.state.page_data.is_empty() {
    let page_json = serde_json::to_string(&parts.state.page_data)
      .map_err(|e| DocumentError::Serialize(e.to_string()))?;
    scripts.push_str(&data_script(&config.ids.page_data_id, &page_json));
  }
  for src in &config.scripts {
    scripts.push_str(&format!(r#"<script type="module" src="{}"></script>"#, escape_html(src)));
  }

  Ok(inject_before_body_end(&html, &scripts))
}
