/* src/server/injector/rust/src/token.rs */

#[derive(Debug)]
pub(crate) enum Token {
  Text(String),
  Marker(String), // directive body (between <!--purr: and -->)
}

pub(crate) const MARKER_OPEN: &str = "<!--purr:";
pub(crate) const MARKER_CLOSE: &str = "-->";

pub(crate) fn tokenize(template: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut pos = 0;

  while pos < template.len() {
    let Some(rel) = template[pos..].find(MARKER_OPEN) else {
      tokens.push(Token::Text(template[pos..].to_string()));
      break;
    };
    let marker_start = pos + rel;
    if marker_start > pos {
      tokens.push(Token::Text(template[pos..marker_start].to_string()));
    }
    let after_open = marker_start + MARKER_OPEN.len();
    match template[after_open..].find(MARKER_CLOSE) {
      Some(close_rel) => {
        let directive = template[after_open..after_open + close_rel].trim().to_string();
        tokens.push(Token::Marker(directive));
        pos = after_open + close_rel + MARKER_CLOSE.len();
      }
      None => {
        // Unclosed marker -- treat rest as text
        tokens.push(Token::Text(template[marker_start..].to_string()));
        break;
      }
    }
  }

  tokens
}
