/* src/server/engine/rust/src/route.rs */

//! Route table shared by the server renderer, the static path resolver and
//! the client router: an ordered list of patterns, first match wins.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub use purr_injector::encode_segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Static(String),
  Param(String),
  CatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteError {
  pattern: String,
  reason: String,
}

impl RouteError {
  fn new(pattern: &str, reason: impl Into<String>) -> Self {
    Self { pattern: pattern.to_string(), reason: reason.into() }
  }
}

impl fmt::Display for RouteError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "invalid route '{}': {}", self.pattern, self.reason)
  }
}

impl std::error::Error for RouteError {}

/// A parsed URL pattern such as `/cats/:id` or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
  source: String,
  segments: Vec<Segment>,
}

fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a request path into segments, ignoring query, fragment and
/// repeated or trailing slashes.
pub fn path_segments(url: &str) -> Vec<&str> {
  let end = url.find(['?', '#']).unwrap_or(url.len());
  url[..end].split('/').filter(|s| !s.is_empty()).collect()
}

impl RoutePattern {
  pub fn parse(pattern: &str) -> Result<Self, RouteError> {
    if pattern != "*" && !pattern.starts_with('/') {
      return Err(RouteError::new(pattern, "must start with '/' or be '*'"));
    }
    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut names = HashSet::new();

    for (i, seg) in raw.iter().enumerate() {
      if *seg == "*" {
        if i + 1 != raw.len() {
          return Err(RouteError::new(pattern, "catch-all '*' must be the last segment"));
        }
        segments.push(Segment::CatchAll);
      } else if let Some(name) = seg.strip_prefix(':') {
        if !is_identifier(name) {
          return Err(RouteError::new(pattern, format!("parameter '{name}' is not an identifier")));
        }
        if !names.insert(name) {
          return Err(RouteError::new(pattern, format!("parameter '{name}' appears twice")));
        }
        segments.push(Segment::Param(name.to_string()));
      } else if seg.contains('*') || seg.contains(':') {
        return Err(RouteError::new(pattern, format!("segment '{seg}' mixes literal and wildcard")));
      } else {
        segments.push(Segment::Static((*seg).to_string()));
      }
    }

    Ok(Self { source: pattern.to_string(), segments })
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Whether both patterns match exactly the same URLs. Parameter names
  /// do not matter.
  pub fn same_shape(&self, other: &Self) -> bool {
    self.segments.len() == other.segments.len()
      && self.segments.iter().zip(&other.segments).all(|pair| match pair {
        (Segment::Static(a), Segment::Static(b)) => a == b,
        (Segment::Param(_), Segment::Param(_)) | (Segment::CatchAll, Segment::CatchAll) => true,
        _ => false,
      })
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  pub fn is_dynamic(&self) -> bool {
    self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
  }

  pub fn is_catch_all(&self) -> bool {
    matches!(self.segments.last(), Some(Segment::CatchAll))
  }

  /// Parameter names in pattern order.
  pub fn params(&self) -> impl Iterator<Item = &str> {
    self.segments.iter().filter_map(|s| match s {
      Segment::Param(name) => Some(name.as_str()),
      _ => None,
    })
  }

  /// Match a request path. Catch-all captures the remainder under `*`.
  pub fn matches(&self, url: &str) -> Option<BTreeMap<String, String>> {
    let parts = path_segments(url);
    let mut params = BTreeMap::new();

    for (i, segment) in self.segments.iter().enumerate() {
      match segment {
        Segment::CatchAll => {
          params.insert("*".to_string(), parts.get(i..).unwrap_or_default().join("/"));
          return Some(params);
        }
        Segment::Static(literal) => {
          if parts.get(i) != Some(&literal.as_str()) {
            return None;
          }
        }
        Segment::Param(name) => {
          let value = parts.get(i)?;
          params.insert(name.clone(), decode_segment(value));
        }
      }
    }

    (parts.len() == self.segments.len()).then_some(params)
  }

  /// Substitute parameters into the pattern. Returns `None` when a parameter
  /// is missing or empty, or the pattern is a catch-all.
  pub fn fill(&self, params: &BTreeMap<String, String>) -> Option<String> {
    let mut path = String::new();
    for segment in &self.segments {
      path.push('/');
      match segment {
        Segment::Static(literal) => path.push_str(literal),
        Segment::Param(name) => {
          let value = params.get(name).filter(|v| !v.is_empty())?;
          path.push_str(&encode_segment(value));
        }
        Segment::CatchAll => return None,
      }
    }
    if path.is_empty() {
      path.push('/');
    }
    Some(path)
  }
}

/// Reverse of [`encode_segment`]. Malformed escapes are kept verbatim.
pub fn decode_segment(value: &str) -> String {
  let bytes = value.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'%' && i + 2 < bytes.len() {
      if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
        out.push(hi << 4 | lo);
        i += 3;
        continue;
      }
    }
    out.push(bytes[i]);
    i += 1;
  }
  String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
  match byte {
    b'0'..=b'9' => Some(byte - b'0'),
    b'a'..=b'f' => Some(byte - b'a' + 10),
    b'A'..=b'F' => Some(byte - b'A' + 10),
    _ => None,
  }
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteDescriptor<T> {
  pub pattern: RoutePattern,
  pub target: T,
}

#[derive(Debug)]
pub struct RouteMatch<'a, T> {
  pub route: &'a RouteDescriptor<T>,
  pub params: BTreeMap<String, String>,
}

/// Ordered route table. Patterns are unique and only the last route may be
/// a catch-all.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
  routes: Vec<RouteDescriptor<T>>,
}

impl<T> RouteTable<T> {
  pub fn new(entries: impl IntoIterator<Item = (&'static str, T)>) -> Result<Self, RouteError> {
    let mut routes: Vec<RouteDescriptor<T>> = Vec::new();
    for (pattern, target) in entries {
      let pattern = RoutePattern::parse(pattern)?;
      if routes.iter().any(|r| r.pattern.same_shape(&pattern)) {
        return Err(RouteError::new(pattern.as_str(), "duplicate pattern"));
      }
      if routes.last().is_some_and(|r| r.pattern.is_catch_all()) {
        return Err(RouteError::new(pattern.as_str(), "unreachable after catch-all route"));
      }
      routes.push(RouteDescriptor { pattern, target });
    }
    Ok(Self { routes })
  }

  pub fn routes(&self) -> &[RouteDescriptor<T>] {
    &self.routes
  }

  pub fn lookup(&self, url: &str) -> Option<RouteMatch<'_, T>> {
    self
      .routes
      .iter()
      .find_map(|route| route.pattern.matches(url).map(|params| RouteMatch { route, params }))
  }
}
