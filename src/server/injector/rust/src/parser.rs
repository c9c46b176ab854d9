/* src/server/injector/rust/src/parser.rs */

use crate::TemplateError;
use crate::ast::{AstNode, HeadKind, SlotMode};
use crate::token::Token;

/// Markers that close or split an enclosing block. Seeing one outside the
/// matching block is a template error.
fn is_closer(directive: &str) -> bool {
  matches!(directive, "else" | "endif" | "endeach" | "endmatch" | "endtitle" | "endmeta" | "endlink")
    || directive.starts_with("endif:")
    || directive.starts_with("when:")
}

pub(crate) fn parse(tokens: &[Token]) -> Result<Vec<AstNode>, TemplateError> {
  let mut pos = 0;
  let (nodes, _) = parse_until(tokens, &mut pos, &|_| false, false)?;
  Ok(nodes)
}

/// Parse nodes until `stop` accepts a marker. Returns the nodes plus the
/// marker that stopped parsing (left unconsumed), or `None` at end of input.
fn parse_until(
  tokens: &[Token],
  pos: &mut usize,
  stop: &dyn Fn(&str) -> bool,
  in_head: bool,
) -> Result<(Vec<AstNode>, Option<String>), TemplateError> {
  let mut nodes = Vec::new();

  while *pos < tokens.len() {
    let directive = match &tokens[*pos] {
      Token::Text(value) => {
        nodes.push(AstNode::Text(value.clone()));
        *pos += 1;
        continue;
      }
      Token::Marker(directive) => directive,
    };

    if stop(directive) {
      return Ok((nodes, Some(directive.clone())));
    }
    if is_closer(directive) {
      return Err(TemplateError::new(format!("unexpected <!--purr:{directive}-->")));
    }
    if directive.is_empty() {
      return Err(TemplateError::new("empty <!--purr:--> directive"));
    }
    *pos += 1;

    if let Some(path) = directive.strip_prefix("if:") {
      let endif = format!("endif:{path}");
      let is_end = |d: &str| d == "endif" || d == endif;
      let (then_nodes, closer) =
        parse_until(tokens, pos, &|d| d == "else" || is_end(d), in_head)?;
      let else_nodes = match closer.as_deref() {
        Some("else") => {
          *pos += 1;
          let (nodes, closer) = parse_until(tokens, pos, &is_end, in_head)?;
          require_closer(closer, directive)?;
          nodes
        }
        Some(_) => Vec::new(),
        None => return Err(unclosed(directive)),
      };
      *pos += 1;
      nodes.push(AstNode::If { path: path.to_string(), then_nodes, else_nodes });
    } else if let Some(path) = directive.strip_prefix("each:") {
      let (body_nodes, closer) = parse_until(tokens, pos, &|d| d == "endeach", in_head)?;
      require_closer(closer, directive)?;
      *pos += 1;
      nodes.push(AstNode::Each { path: path.to_string(), body_nodes });
    } else if let Some(path) = directive.strip_prefix("match:") {
      let branches = parse_match(tokens, pos, directive, in_head)?;
      nodes.push(AstNode::Match { path: path.to_string(), branches });
    } else if let Some(name) = directive.strip_prefix("include:") {
      nodes.push(AstNode::Include { name: name.to_string() });
    } else if let Some((kind, end)) = head_kind(directive) {
      if in_head {
        return Err(TemplateError::new(format!(
          "<!--purr:{directive}--> cannot be nested inside another head block"
        )));
      }
      let (body_nodes, closer) = parse_until(tokens, pos, &|d| d == end, true)?;
      require_closer(closer, directive)?;
      *pos += 1;
      nodes.push(AstNode::Head { kind, body_nodes });
    } else if let Some(rest) = directive.find(":attr:") {
      let path = directive[..rest].to_string();
      let attr_name = directive[rest + 6..].to_string();
      nodes.push(AstNode::Attr { path, attr_name });
    } else if let Some(path) = directive.strip_suffix(":html") {
      nodes.push(AstNode::Slot { path: path.to_string(), mode: SlotMode::Html });
    } else if let Some(path) = directive.strip_suffix(":url") {
      nodes.push(AstNode::Slot { path: path.to_string(), mode: SlotMode::Url });
    } else {
      nodes.push(AstNode::Slot { path: directive.clone(), mode: SlotMode::Text });
    }
  }

  Ok((nodes, None))
}

fn parse_match(
  tokens: &[Token],
  pos: &mut usize,
  directive: &str,
  in_head: bool,
) -> Result<Vec<(String, Vec<AstNode>)>, TemplateError> {
  let is_arm = |d: &str| d.starts_with("when:") || d == "endmatch";
  // Whitespace between the match marker and the first arm is dropped
  let (leading, mut closer) = parse_until(tokens, pos, &is_arm, in_head)?;
  if leading.iter().any(|n| !matches!(n, AstNode::Text(t) if t.trim().is_empty())) {
    return Err(TemplateError::new(format!(
      "<!--purr:{directive}--> may only contain when arms"
    )));
  }

  let mut branches = Vec::new();
  loop {
    match closer.as_deref() {
      Some("endmatch") => {
        *pos += 1;
        return Ok(branches);
      }
      Some(arm) => {
        let value = arm.trim_start_matches("when:").to_string();
        *pos += 1;
        let (body, next) = parse_until(tokens, pos, &is_arm, in_head)?;
        branches.push((value, body));
        closer = next;
      }
      None => return Err(unclosed(directive)),
    }
  }
}

fn head_kind(directive: &str) -> Option<(HeadKind, &'static str)> {
  if directive == "title" {
    return Some((HeadKind::Title, "endtitle"));
  }
  if let Some(name) = directive.strip_prefix("meta:") {
    return Some((HeadKind::Meta { name: name.to_string() }, "endmeta"));
  }
  if let Some(rel) = directive.strip_prefix("link:") {
    return Some((HeadKind::Link { rel: rel.to_string() }, "endlink"));
  }
  None
}

fn require_closer(closer: Option<String>, directive: &str) -> Result<(), TemplateError> {
  match closer {
    Some(_) => Ok(()),
    None => Err(unclosed(directive)),
  }
}

fn unclosed(directive: &str) -> TemplateError {
  TemplateError::new(format!("<!--purr:{directive}--> is never closed"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::tokenize;

  fn parse_str(src: &str) -> Result<Vec<AstNode>, TemplateError> {
    parse(&tokenize(src))
  }

  #[test]
  fn if_else_endif() {
    let nodes = parse_str("<!--purr:if:cats-->a<!--purr:else-->b<!--purr:endif:cats-->").unwrap();
    assert_eq!(nodes.len(), 1);
    match &nodes[0] {
      AstNode::If { path, then_nodes, else_nodes } => {
        assert_eq!(path, "cats");
        assert_eq!(then_nodes.len(), 1);
        assert_eq!(else_nodes.len(), 1);
      }
      other => panic!("expected If, got {other:?}"),
    }
  }

  #[test]
  fn bare_endif_closes() {
    assert!(parse_str("<!--purr:if:x-->a<!--purr:endif-->").is_ok());
  }

  #[test]
  fn mismatched_endif_is_unclosed() {
    let err = parse_str("<!--purr:if:a-->x<!--purr:endif:b-->").unwrap_err();
    assert!(err.to_string().contains("unexpected"), "{err}");
  }

  #[test]
  fn unclosed_each() {
    let err = parse_str("<!--purr:each:cats--><li></li>").unwrap_err();
    assert!(err.to_string().contains("never closed"));
  }

  #[test]
  fn stray_closer() {
    let err = parse_str("text<!--purr:endeach-->").unwrap_err();
    assert!(err.to_string().contains("unexpected"));
  }

  #[test]
  fn match_arms() {
    let src = "<!--purr:match:status--> <!--purr:when:adopted-->A<!--purr:when:available-->B<!--purr:endmatch-->";
    let nodes = parse_str(src).unwrap();
    match &nodes[0] {
      AstNode::Match { branches, .. } => {
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].0, "adopted");
        assert_eq!(branches[1].0, "available");
      }
      other => panic!("expected Match, got {other:?}"),
    }
  }

  #[test]
  fn match_rejects_content_before_first_arm() {
    assert!(parse_str("<!--purr:match:s-->junk<!--purr:endmatch-->").is_err());
  }

  #[test]
  fn head_blocks() {
    let src = "<!--purr:title-->Adopt <!--purr:cat.name--><!--purr:endtitle--><!--purr:meta:description-->x<!--purr:endmeta-->";
    let nodes = parse_str(src).unwrap();
    assert!(matches!(&nodes[0], AstNode::Head { kind: HeadKind::Title, body_nodes } if body_nodes.len() == 2));
    assert!(matches!(&nodes[1], AstNode::Head { kind: HeadKind::Meta { name }, .. } if name == "description"));
  }

  #[test]
  fn nested_head_rejected() {
    let err =
      parse_str("<!--purr:title--><!--purr:meta:x-->y<!--purr:endmeta--><!--purr:endtitle-->")
        .unwrap_err();
    assert!(err.to_string().contains("nested"));
  }

  #[test]
  fn slot_modes() {
    let nodes =
      parse_str("<!--purr:bio:html--><!--purr:photo:attr:src--><!--purr:name--><!--purr:slug:url-->")
        .unwrap();
    assert!(matches!(&nodes[0], AstNode::Slot { mode: SlotMode::Html, .. }));
    assert!(matches!(&nodes[1], AstNode::Attr { attr_name, .. } if attr_name == "src"));
    assert!(matches!(&nodes[2], AstNode::Slot { mode: SlotMode::Text, .. }));
    assert!(matches!(&nodes[3], AstNode::Slot { mode: SlotMode::Url, .. }));
  }

  #[test]
  fn empty_directive_rejected() {
    assert!(parse_str("<!--purr:-->").is_err());
  }
}
