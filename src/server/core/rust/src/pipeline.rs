/* src/server/core/rust/src/pipeline.rs */

use purr_engine::gate::GateState;
use purr_engine::route::{encode_segment, path_segments};
use purr_engine::{DocumentParts, PageState, QueryCache, assemble};
use purr_injector::Rendered;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::auth::{check_access, unix_now};
use crate::errors::SiteError;
use crate::page::{Access, PageKind};
use crate::prefetch::prefetch;
use crate::site::Site;
use crate::templates::{ERROR_BOUNDARY, GATE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
  Ok,
  NotFound,
  Unavailable,
}

impl RenderStatus {
  pub fn http_status(self) -> u16 {
    match self {
      Self::Ok => 200,
      Self::NotFound => 404,
      Self::Unavailable => 503,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
  Page { status: RenderStatus, html: String },
  Redirect { location: String },
}

impl RenderOutcome {
  pub fn status(&self) -> Option<RenderStatus> {
    match self {
      Self::Page { status, .. } => Some(*status),
      Self::Redirect { .. } => None,
    }
  }

  pub fn html(&self) -> Option<&str> {
    match self {
      Self::Page { html, .. } => Some(html.as_str()),
      Self::Redirect { .. } => None,
    }
  }
}

/// Who is asking for the page.
#[derive(Debug, Clone, Copy)]
enum Visitor<'a> {
  /// Build-time prerender: nobody is signed in.
  Static,
  Request(Option<&'a str>),
}

/// Canonical path: no query or fragment, no trailing slash.
pub fn normalize_path(url: &str) -> String {
  let segments = path_segments(url);
  format!("/{}", segments.join("/"))
}

impl Site {
  /// Prerender `url` for static output. Protected pages render the gate's
  /// checking shell and read no data.
  pub async fn render_document(&self, url: &str) -> Result<RenderOutcome, SiteError> {
    self.render(url, Visitor::Static).await
  }

  /// Render `url` for one live request carrying an optional access token.
  pub async fn render_request(&self, url: &str, token: Option<&str>) -> Result<RenderOutcome, SiteError> {
    self.render(url, Visitor::Request(token)).await
  }

  async fn render(&self, url: &str, visitor: Visitor<'_>) -> Result<RenderOutcome, SiteError> {
    let path = normalize_path(url);
    let hit = self
      .routes
      .lookup(&path)
      .ok_or_else(|| SiteError::not_found(format!("no route matches {path}")))?;
    let route = hit.route.target;
    let mut context = Map::new();
    context.insert("site".into(), serde_json::to_value(&self.meta).unwrap_or(Value::Null));
    context.insert("route".into(), json!({ "path": path, "kind": route.kind, "params": hit.params }));

    if let Access::Protected(required) = route.access {
      let state = match visitor {
        Visitor::Static => GateState::Checking,
        Visitor::Request(token) => {
          let gateway = self.gateway().await;
          check_access(gateway.as_ref(), token, required, unix_now()).await
        }
      };
      match state {
        GateState::Authorized { session } => {
          context.insert("session".into(), serde_json::to_value(&session).unwrap_or(Value::Null));
        }
        GateState::Unauthenticated { connection_error: false } => {
          tracing::debug!(url = %path, "redirecting unauthenticated visitor");
          return Ok(RenderOutcome::Redirect { location: format!("/login?next={}", encode_segment(&path)) });
        }
        GateState::Insufficient => {
          tracing::debug!(url = %path, "redirecting visitor without the required role");
          return Ok(RenderOutcome::Redirect { location: "/".to_string() });
        }
        GateState::Checking | GateState::Unauthenticated { connection_error: true } => {
          let status =
            if matches!(state, GateState::Checking) { RenderStatus::Ok } else { RenderStatus::Unavailable };
          context.insert("gate".into(), serde_json::to_value(&state).unwrap_or(Value::Null));
          return self.finish(&path, GATE, &Value::Object(context), &QueryCache::new(), Map::new(), status);
        }
      }
    }

    let gateway = self.gateway().await;
    let mut cache = QueryCache::new();
    let report = prefetch(&path, gateway.as_ref(), &mut cache).await;

    let mut data = Map::new();
    let mut statuses = Map::new();
    for req in &report.requirements {
      if let Some(value) = cache.data(&req.key) {
        data.insert(req.slot.to_string(), value.clone());
      }
      statuses.insert(req.slot.to_string(), Value::from(report.status(&cache, &req.key).as_str()));
    }
    context.insert("data".into(), Value::Object(data));
    context.insert("status".into(), Value::Object(statuses));
    context.insert("page".into(), Value::Object(report.page_data.clone()));

    let status = if report.kind == PageKind::NotFound || report.primary_missing(&cache) {
      RenderStatus::NotFound
    } else {
      RenderStatus::Ok
    };
    self.finish(&path, route.kind.template(), &Value::Object(context), &cache, report.page_data, status)
  }

  /// Render the body (falling back to the error boundary) and assemble the
  /// document.
  fn finish(
    &self,
    path: &str,
    template: &str,
    context: &Value,
    cache: &QueryCache,
    page_data: Map<String, Value>,
    status: RenderStatus,
  ) -> Result<RenderOutcome, SiteError> {
    let rendered = self.render_body(path, template, context)?;
    let state = PageState::new(cache, page_data);
    let html = assemble(
      &self.templates.shell,
      &self.document,
      &DocumentParts { body: &rendered.html, head: &rendered.head, state: &state },
    )?;
    Ok(RenderOutcome::Page { status, html })
  }

  fn render_body(&self, path: &str, template: &str, context: &Value) -> Result<Rendered, SiteError> {
    match self.templates.set.render(template, context) {
      Ok(rendered) => Ok(rendered),
      Err(err) => {
        tracing::error!(url = %path, template, error = %err, "page render failed, showing error boundary");
        Ok(self.templates.set.render(ERROR_BOUNDARY, context)?)
      }
    }
  }
}

#[cfg(test)]
mod tests;
