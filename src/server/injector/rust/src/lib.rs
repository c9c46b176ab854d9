/* src/server/injector/rust/src/lib.rs */

//! Template renderer for Purrhaven pages.
//!
//! Templates are plain HTML with `<!--purr:...-->` directives:
//!
//! - `path` / `path:html` text (escaped) and raw slots
//! - `path:attr:name` attribute on the next tag
//! - `if:path` .. `else` .. `endif:path`, `each:path` .. `endeach`,
//!   `match:path` .. `when:value` .. `endmatch`
//! - `include:name` renders another template of the same set (a child component)
//! - `title` .. `endtitle`, `meta:name` .. `endmeta`, `link:rel` .. `endlink`
//!   are head blocks: their body is returned as a [`HeadTag`] instead of
//!   being written into the body HTML.
//!
//! Rendering returns the head tags alongside the HTML, so there is no shared
//! metadata slot to read back after a render.

mod ast;
mod helpers;
mod parser;
mod render;
mod token;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use ast::AstNode;
pub use helpers::{encode_segment, escape_html};
use render::{Output, RenderContext, inject_attributes, render};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
  message: String,
}

impl TemplateError {
  pub(crate) fn new(message: impl Into<String>) -> Self {
    Self { message: message.into() }
  }

  fn in_template(self, name: &str) -> Self {
    Self { message: format!("template '{name}': {}", self.message) }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for TemplateError {}

/// Failure while rendering an already-parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
  MissingTemplate(String),
  IncludeDepth { name: String, depth: usize },
}

impl fmt::Display for RenderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingTemplate(name) => write!(f, "template '{name}' is not registered"),
      Self::IncludeDepth { name, depth } => {
        write!(f, "include of '{name}' exceeds depth {depth} (cyclic include?)")
      }
    }
  }
}

impl std::error::Error for RenderError {}

/// A `<head>` element emitted by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum HeadTag {
  Title(String),
  Meta { name: String, content: String },
  Link { rel: String, href: String },
}

impl HeadTag {
  pub fn to_html(&self) -> String {
    match self {
      Self::Title(text) => format!("<title>{}</title>", escape_html(text)),
      Self::Meta { name, content } => {
        // Open Graph properties use `property`, everything else `name`
        let attr = if name.starts_with("og:") { "property" } else { "name" };
        format!(r#"<meta {attr}="{}" content="{}">"#, escape_html(name), escape_html(content))
      }
      Self::Link { rel, href } => {
        format!(r#"<link rel="{}" href="{}">"#, escape_html(rel), escape_html(href))
      }
    }
  }
}

/// Result of rendering one template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
  pub html: String,
  pub head: Vec<HeadTag>,
}

/// A parsed template.
#[derive(Debug)]
pub struct Template {
  nodes: Vec<AstNode>,
  includes: BTreeSet<String>,
}

impl Template {
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    let tokens = token::tokenize(source);
    let nodes = parser::parse(&tokens)?;
    let mut includes = BTreeSet::new();
    collect_includes(&nodes, &mut includes);
    Ok(Self { nodes, includes })
  }
}

fn collect_includes(nodes: &[AstNode], out: &mut BTreeSet<String>) {
  for node in nodes {
    match node {
      AstNode::Include { name } => {
        out.insert(name.clone());
      }
      AstNode::If { then_nodes, else_nodes, .. } => {
        collect_includes(then_nodes, out);
        collect_includes(else_nodes, out);
      }
      AstNode::Each { body_nodes, .. } | AstNode::Head { body_nodes, .. } => {
        collect_includes(body_nodes, out);
      }
      AstNode::Match { branches, .. } => {
        for (_, body) in branches {
          collect_includes(body, out);
        }
      }
      AstNode::Text(_) | AstNode::Slot { .. } | AstNode::Attr { .. } => {}
    }
  }
}

/// Named templates that can include one another.
#[derive(Debug, Default)]
pub struct TemplateSet {
  templates: BTreeMap<String, Template>,
}

impl TemplateSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse and register `source` under `name`, replacing any previous entry.
  pub fn insert(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
    let template = Template::parse(source).map_err(|e| e.in_template(name))?;
    self.templates.insert(name.to_string(), template);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Template> {
    self.templates.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.templates.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.templates.keys().map(String::as_str)
  }

  /// `(template, include)` pairs whose include target is not registered.
  pub fn missing_includes(&self) -> Vec<(String, String)> {
    let mut missing = Vec::new();
    for (name, template) in &self.templates {
      for include in &template.includes {
        if !self.templates.contains_key(include) {
          missing.push((name.clone(), include.clone()));
        }
      }
    }
    missing
  }

  /// Render `name` against `data`, returning body HTML and head tags.
  pub fn render(&self, name: &str, data: &Value) -> Result<Rendered, RenderError> {
    let template = self.get(name).ok_or_else(|| RenderError::MissingTemplate(name.to_string()))?;
    let mut ctx = RenderContext { set: self, attrs: Vec::new(), head: Vec::new(), depth: 0 };
    let mut html = render(&template.nodes, data, &mut ctx, Output::Html)?;
    if !ctx.attrs.is_empty() {
      html = inject_attributes(html, &ctx.attrs);
    }
    Ok(Rendered { html, head: ctx.head })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn render_one(src: &str, data: &Value) -> Rendered {
    let mut set = TemplateSet::new();
    set.insert("t", src).unwrap();
    set.render("t", data).unwrap()
  }

  fn html(src: &str, data: &Value) -> String {
    render_one(src, data).html
  }

  // -- Slots --

  #[test]
  fn text_slot_escapes() {
    let out = html("<p><!--purr:name--></p>", &json!({"name": "<b>Tom</b>"}));
    assert_eq!(out, "<p>&lt;b&gt;Tom&lt;/b&gt;</p>");
  }

  #[test]
  fn raw_slot() {
    let out = html("<div><!--purr:bio:html--></div>", &json!({"bio": "<em>shy</em>"}));
    assert_eq!(out, "<div><em>shy</em></div>");
  }

  #[test]
  fn url_slot_encodes_segment() {
    let src = r#"<a href="/news/<!--purr:slug:url-->">x</a>"#;
    let out = html(src, &json!({"slug": "open house/<b>"}));
    assert_eq!(out, r#"<a href="/news/open%20house%2F%3Cb%3E">x</a>"#);
  }

  #[test]
  fn missing_slot_renders_empty() {
    assert_eq!(html("<p><!--purr:nope--></p>", &json!({})), "<p></p>");
  }

  // -- Attributes --

  #[test]
  fn attr_slot() {
    let out = html(r#"<!--purr:photo:attr:src--><img alt="cat">"#, &json!({"photo": "/a.jpg"}));
    assert_eq!(out, r#"<img src="/a.jpg" alt="cat">"#);
  }

  #[test]
  fn stacked_attrs_keep_source_order() {
    let out = html(
      "<!--purr:href:attr:href--><!--purr:title:attr:title--><a>x</a>",
      &json!({"href": "/cats", "title": "Cats"}),
    );
    assert_eq!(out, r#"<a href="/cats" title="Cats">x</a>"#);
  }

  #[test]
  fn boolean_attr() {
    let tmpl = "<!--purr:adopted:attr:hidden--><span>badge</span>";
    assert_eq!(html(tmpl, &json!({"adopted": true})), "<span hidden>badge</span>");
    assert_eq!(html(tmpl, &json!({"adopted": false})), "<span>badge</span>");
  }

  #[test]
  fn attr_value_cannot_forge_marker() {
    let out = html("<!--purr:v:attr:title--><i></i>", &json!({"v": "\u{0}PURR_ATTR_0\u{0}"}));
    assert_eq!(out, r#"<i title="PURR_ATTR_0"></i>"#);
  }

  // -- Blocks --

  #[test]
  fn if_else() {
    let tmpl = "<!--purr:if:cats-->some<!--purr:else-->none<!--purr:endif:cats-->";
    assert_eq!(html(tmpl, &json!({"cats": [1]})), "some");
    assert_eq!(html(tmpl, &json!({"cats": []})), "none");
  }

  #[test]
  fn each_with_scopes() {
    let tmpl = "<!--purr:each:groups--><!--purr:each:$.cats--><!--purr:$$.name-->/<!--purr:$.name--> <!--purr:endeach--><!--purr:endeach-->";
    let data = json!({"groups": [{"name": "A", "cats": [{"name": "x"}, {"name": "y"}]}]});
    assert_eq!(html(tmpl, &data), "A/x A/y ");
  }

  #[test]
  fn match_branch() {
    let tmpl = "<!--purr:match:status--><!--purr:when:adopted-->Home!<!--purr:when:available-->Adopt me<!--purr:endmatch-->";
    assert_eq!(html(tmpl, &json!({"status": "available"})), "Adopt me");
    assert_eq!(html(tmpl, &json!({"status": "foster"})), "");
  }

  // -- Includes --

  #[test]
  fn include_renders_child_with_same_data() {
    let mut set = TemplateSet::new();
    set.insert("card", "<article><!--purr:$.name--></article>").unwrap();
    set.insert("list", "<!--purr:each:cats--><!--purr:include:card--><!--purr:endeach-->").unwrap();
    let out = set.render("list", &json!({"cats": [{"name": "Mochi"}, {"name": "Tofu"}]})).unwrap();
    assert_eq!(out.html, "<article>Mochi</article><article>Tofu</article>");
  }

  #[test]
  fn missing_include_is_render_error() {
    let mut set = TemplateSet::new();
    set.insert("page", "<!--purr:include:ghost-->").unwrap();
    assert_eq!(
      set.render("page", &json!({})).unwrap_err(),
      RenderError::MissingTemplate("ghost".into())
    );
    assert_eq!(set.missing_includes(), vec![("page".to_string(), "ghost".to_string())]);
  }

  #[test]
  fn cyclic_include_hits_depth_limit() {
    let mut set = TemplateSet::new();
    set.insert("a", "<!--purr:include:b-->").unwrap();
    set.insert("b", "<!--purr:include:a-->").unwrap();
    assert!(matches!(set.render("a", &json!({})), Err(RenderError::IncludeDepth { .. })));
  }

  #[test]
  fn parse_error_names_template() {
    let mut set = TemplateSet::new();
    let err = set.insert("cat_detail", "<!--purr:if:cat-->").unwrap_err();
    assert!(err.to_string().starts_with("template 'cat_detail'"));
  }

  // -- Head tags --

  #[test]
  fn head_blocks_are_returned_not_inlined() {
    let tmpl = "<!--purr:title-->Adopt <!--purr:cat.name--> | Purrhaven<!--purr:endtitle--><!--purr:meta:description--><!--purr:cat.bio--><!--purr:endmeta--><h1><!--purr:cat.name--></h1>";
    let out = render_one(tmpl, &json!({"cat": {"name": "Tom & Jerry", "bio": "A \"lap\" cat"}}));
    assert_eq!(out.html, "<h1>Tom &amp; Jerry</h1>");
    assert_eq!(
      out.head,
      vec![
        HeadTag::Title("Adopt Tom & Jerry | Purrhaven".into()),
        HeadTag::Meta { name: "description".into(), content: "A \"lap\" cat".into() },
      ]
    );
    assert_eq!(out.head[0].to_html(), "<title>Adopt Tom &amp; Jerry | Purrhaven</title>");
    assert_eq!(
      out.head[1].to_html(),
      r#"<meta name="description" content="A &quot;lap&quot; cat">"#
    );
  }

  #[test]
  fn head_from_included_child() {
    let mut set = TemplateSet::new();
    set.insert("seo", "<!--purr:link:canonical-->https://purrhaven.org<!--purr:route.path--><!--purr:endlink-->").unwrap();
    set.insert("page", "<!--purr:include:seo--><main></main>").unwrap();
    let out = set.render("page", &json!({"route": {"path": "/cats"}})).unwrap();
    assert_eq!(out.html, "<main></main>");
    assert_eq!(
      out.head,
      vec![HeadTag::Link { rel: "canonical".into(), href: "https://purrhaven.org/cats".into() }]
    );
  }

  #[test]
  fn og_meta_uses_property() {
    let tag = HeadTag::Meta { name: "og:title".into(), content: "Mochi".into() };
    assert_eq!(tag.to_html(), r#"<meta property="og:title" content="Mochi">"#);
  }

  #[test]
  fn renders_are_independent() {
    let mut set = TemplateSet::new();
    set.insert("t", "<!--purr:title--><!--purr:n--><!--purr:endtitle-->").unwrap();
    let a = set.render("t", &json!({"n": "A"})).unwrap();
    let b = set.render("t", &json!({"n": "B"})).unwrap();
    assert_eq!(a.head, vec![HeadTag::Title("A".into())]);
    assert_eq!(b.head, vec![HeadTag::Title("B".into())]);
  }
}
