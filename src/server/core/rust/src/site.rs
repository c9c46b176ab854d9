/* src/server/core/rust/src/site.rs */

use std::sync::Arc;

use purr_engine::{DocumentConfig, RouteTable};
use purr_gateway::{DataGateway, LazyGateway};
use serde::{Deserialize, Serialize};

use crate::errors::SiteError;
use crate::page::{PageRoute, route_table};
use crate::resolve::resolve_paths;
use crate::templates::Templates;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
  pub href: String,
  pub label: String,
}

/// Organisation details exposed to every template as `site`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
  pub name: String,
  pub tagline: String,
  pub donate_url: Option<String>,
  pub nav: Vec<NavLink>,
}

impl Default for SiteMeta {
  fn default() -> Self {
    let link = |href: &str, label: &str| NavLink { href: href.to_string(), label: label.to_string() };
    Self {
      name: "Purrhaven Rescue".to_string(),
      tagline: "Cat rescue and adoption".to_string(),
      donate_url: None,
      nav: vec![
        link("/cats", "Adopt"),
        link("/news", "News"),
        link("/transparency", "Transparency"),
        link("/donate", "Donate"),
      ],
    }
  }
}

/// Everything needed to render any page of the site. Cheap to share behind
/// an `Arc`; each render builds its own cache.
pub struct Site {
  pub(crate) routes: RouteTable<PageRoute>,
  pub(crate) templates: Templates,
  pub(crate) document: DocumentConfig,
  pub(crate) meta: SiteMeta,
  gateway: Arc<LazyGateway>,
}

impl Site {
  pub fn new(gateway: LazyGateway) -> Result<Self, SiteError> {
    Ok(Self {
      routes: route_table()?,
      templates: Templates::builtin()?,
      document: DocumentConfig::default(),
      meta: SiteMeta::default(),
      gateway: Arc::new(gateway),
    })
  }

  pub fn templates(mut self, templates: Templates) -> Result<Self, SiteError> {
    templates.validate()?;
    self.templates = templates;
    Ok(self)
  }

  pub fn document(mut self, document: DocumentConfig) -> Self {
    self.document = document;
    self
  }

  pub fn meta(mut self, meta: SiteMeta) -> Self {
    self.meta = meta;
    self
  }

  pub fn routes(&self) -> &RouteTable<PageRoute> {
    &self.routes
  }

  pub fn document_config(&self) -> &DocumentConfig {
    &self.document
  }

  /// The shared gateway, acquired on first use.
  pub async fn gateway(&self) -> Arc<dyn DataGateway> {
    self.gateway.get().await
  }

  /// Paths to prerender.
  pub async fn static_paths(&self) -> Vec<String> {
    let gateway = self.gateway().await;
    resolve_paths(&self.routes, gateway.as_ref()).await
  }
}
