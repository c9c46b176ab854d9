/* src/server/injector/rust/src/ast.rs */

#[derive(Debug)]
pub(crate) enum AstNode {
  Text(String),
  Slot { path: String, mode: SlotMode },
  Attr { path: String, attr_name: String },
  If { path: String, then_nodes: Vec<AstNode>, else_nodes: Vec<AstNode> },
  Each { path: String, body_nodes: Vec<AstNode> },
  Match { path: String, branches: Vec<(String, Vec<AstNode>)> },
  Include { name: String },
  Head { kind: HeadKind, body_nodes: Vec<AstNode> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotMode {
  Text,
  Html,
  /// Percent-encoded as a single URL path segment.
  Url,
}

/// Head block flavour. The block body renders to plain text which becomes
/// the tag's text (`title`), `content` (`meta`) or `href` (`link`).
#[derive(Debug)]
pub(crate) enum HeadKind {
  Title,
  Meta { name: String },
  Link { rel: String },
}
