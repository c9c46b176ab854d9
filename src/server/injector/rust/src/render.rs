/* src/server/injector/rust/src/render.rs */

use serde_json::Value;

use crate::ast::{AstNode, HeadKind, SlotMode};
use crate::helpers::{
  encode_segment, escape_html, is_html_boolean_attr, is_truthy, resolve, stringify,
};
use crate::{HeadTag, RenderError, TemplateSet};

/// Includes nested deeper than this are treated as a cycle.
pub(crate) const MAX_INCLUDE_DEPTH: usize = 16;

pub(crate) struct AttrEntry {
  pub(crate) marker: String,
  pub(crate) attr_name: String,
  pub(crate) value: String,
}

pub(crate) struct RenderContext<'a> {
  pub(crate) set: &'a TemplateSet,
  pub(crate) attrs: Vec<AttrEntry>,
  pub(crate) head: Vec<HeadTag>,
  pub(crate) depth: usize,
}

/// Output flavour. Head block bodies render as plain text: slots are not
/// escaped there because `HeadTag::to_html` escapes the finished value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
  Html,
  Plain,
}

pub(crate) fn render(
  nodes: &[AstNode],
  data: &Value,
  ctx: &mut RenderContext<'_>,
  output: Output,
) -> Result<String, RenderError> {
  let mut out = String::new();

  for node in nodes {
    match node {
      AstNode::Text(value) => out.push_str(value),

      AstNode::Slot { path, mode } => {
        let text = stringify(resolve(path, data).unwrap_or(&Value::Null));
        match mode {
          // The encoded form is pure ASCII outside the HTML special set.
          SlotMode::Url => out.push_str(&encode_segment(&text)),
          SlotMode::Html => out.push_str(&text),
          SlotMode::Text if output == Output::Plain => out.push_str(&text),
          SlotMode::Text => out.push_str(&escape_html(&text)),
        }
      }

      AstNode::Attr { path, attr_name } => {
        if output == Output::Plain {
          continue;
        }
        let Some(value) = resolve(path, data) else { continue };
        // Markers are NUL-delimited; escape_html strips NUL from data so a
        // value can never forge one.
        let value = if is_html_boolean_attr(attr_name) {
          if !is_truthy(value) {
            continue;
          }
          String::new()
        } else {
          escape_html(&stringify(value))
        };
        let marker = format!("\x00PURR_ATTR_{}\x00", ctx.attrs.len());
        out.push_str(&marker);
        ctx.attrs.push(AttrEntry { marker, attr_name: attr_name.clone(), value });
      }

      AstNode::If { path, then_nodes, else_nodes } => {
        let branch =
          if resolve(path, data).is_some_and(is_truthy) { then_nodes } else { else_nodes };
        out.push_str(&render(branch, data, ctx, output)?);
      }

      AstNode::Each { path, body_nodes } => {
        let Some(Value::Array(items)) = resolve(path, data) else { continue };
        for item in items {
          // `$` is the current item, `$$` the enclosing loop's item
          let scoped = match data {
            Value::Object(map) => {
              let mut scoped = map.clone();
              if let Some(outer) = scoped.get("$").cloned() {
                scoped.insert("$$".to_string(), outer);
              }
              scoped.insert("$".to_string(), item.clone());
              Value::Object(scoped)
            }
            other => other.clone(),
          };
          out.push_str(&render(body_nodes, &scoped, ctx, output)?);
        }
      }

      AstNode::Match { path, branches } => {
        let key = stringify(resolve(path, data).unwrap_or(&Value::Null));
        if let Some((_, body)) = branches.iter().find(|(value, _)| *value == key) {
          out.push_str(&render(body, data, ctx, output)?);
        }
      }

      AstNode::Include { name } => {
        let template =
          ctx.set.get(name).ok_or_else(|| RenderError::MissingTemplate(name.clone()))?;
        if ctx.depth >= MAX_INCLUDE_DEPTH {
          return Err(RenderError::IncludeDepth { name: name.clone(), depth: ctx.depth });
        }
        ctx.depth += 1;
        let rendered = render(&template.nodes, data, ctx, output);
        ctx.depth -= 1;
        out.push_str(&rendered?);
      }

      AstNode::Head { kind, body_nodes } => {
        let text = render(body_nodes, data, ctx, Output::Plain)?;
        let text = text.trim().to_string();
        if output == Output::Plain {
          out.push_str(&text);
          continue;
        }
        let tag = match kind {
          HeadKind::Title => HeadTag::Title(text),
          HeadKind::Meta { name } => HeadTag::Meta { name: name.clone(), content: text },
          HeadKind::Link { rel } => HeadTag::Link { rel: rel.clone(), href: text },
        };
        ctx.head.push(tag);
      }
    }
  }

  Ok(out)
}

/// Splice collected attributes into the tag that follows each marker.
pub(crate) fn inject_attributes(mut html: String, attrs: &[AttrEntry]) -> String {
  // Reverse order keeps stacked markers in source order on the same tag
  for entry in attrs.iter().rev() {
    let Some(pos) = html.find(&entry.marker) else { continue };
    html.replace_range(pos..pos + entry.marker.len(), "");
    let Some(tag_rel) = html[pos..].find('<') else { continue };
    let abs_start = pos + tag_rel;
    let bytes = html.as_bytes();
    let mut tag_name_end = abs_start + 1;
    while tag_name_end < bytes.len() && !matches!(bytes[tag_name_end], b' ' | b'>' | b'/' | b'\n' | b'\t')
    {
      tag_name_end += 1;
    }
    let injection = if entry.value.is_empty() && is_html_boolean_attr(&entry.attr_name) {
      format!(" {}", entry.attr_name)
    } else {
      format!(r#" {}="{}""#, entry.attr_name, entry.value)
    };
    html.insert_str(tag_name_end, &injection);
  }
  html
}
