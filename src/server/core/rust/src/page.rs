/* src/server/core/rust/src/page.rs */

//! The site's page catalog. Every page kind declares its route, access
//! level, template and data needs through the same interface, so the
//! prefetcher and resolver never special-case a page.

use std::collections::BTreeMap;

use purr_engine::gate::Role;
use purr_engine::{QueryKey, RouteError, RouteTable};
use purr_gateway::Select;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
  Home,
  CatList,
  CatDetail,
  NewsList,
  NewsArticle,
  Transparency,
  Donate,
  SignIn,
  AdminDashboard,
  AdminCats,
  NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
  Public,
  Protected(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// Zero or one row; zero rows is recorded as an explicit empty entry.
  One,
  Many,
}

/// One read a page needs before it can render.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequirement {
  pub key: QueryKey,
  /// Name under `data` in the template context.
  pub slot: &'static str,
  pub select: Select,
  pub shape: Shape,
  /// Also expose the result under this `pageData` field.
  pub page_data: Option<&'static str>,
}

impl DataRequirement {
  fn many(key: QueryKey, slot: &'static str, select: Select) -> Self {
    Self { key, slot, select, shape: Shape::Many, page_data: None }
  }

  fn one(key: QueryKey, slot: &'static str, select: Select, page_data: &'static str) -> Self {
    Self { key, slot, select: select.limit(1), shape: Shape::One, page_data: Some(page_data) }
  }
}

/// Where the identifiers of a dynamic route come from at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierSource {
  pub param: &'static str,
  pub select: Select,
}

impl IdentifierSource {
  /// Column read from each listed row.
  pub fn column(&self) -> &str {
    self.select.columns.first().map_or(self.param, String::as_str)
  }
}

/// Descriptor target stored in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRoute {
  pub kind: PageKind,
  pub access: Access,
}

const CAT_COLUMNS: [&str; 9] =
  ["id", "name", "age", "sex", "breed", "description", "photo_url", "status", "created_at"];
const NEWS_COLUMNS: [&str; 6] = ["id", "slug", "title", "excerpt", "body", "published_at"];

impl PageKind {
  pub const ALL: [PageKind; 11] = [
    Self::Home,
    Self::CatList,
    Self::CatDetail,
    Self::NewsList,
    Self::NewsArticle,
    Self::Transparency,
    Self::Donate,
    Self::SignIn,
    Self::AdminDashboard,
    Self::AdminCats,
    Self::NotFound,
  ];

  pub fn pattern(self) -> &'static str {
    match self {
      Self::Home => "/",
      Self::CatList => "/cats",
      Self::CatDetail => "/cats/:id",
      Self::NewsList => "/news",
      Self::NewsArticle => "/news/:slug",
      Self::Transparency => "/transparency",
      Self::Donate => "/donate",
      Self::SignIn => "/login",
      Self::AdminDashboard => "/admin",
      Self::AdminCats => "/admin/cats",
      Self::NotFound => "*",
    }
  }

  pub fn access(self) -> Access {
    match self {
      Self::AdminDashboard | Self::AdminCats => Access::Protected(Role::Admin),
      _ => Access::Public,
    }
  }

  /// Template rendered for this page.
  pub fn template(self) -> &'static str {
    match self {
      Self::Home => "home",
      Self::CatList => "cat_list",
      Self::CatDetail => "cat_detail",
      Self::NewsList => "news_list",
      Self::NewsArticle => "news_article",
      Self::Transparency => "transparency",
      Self::Donate => "donate",
      Self::SignIn => "sign_in",
      Self::AdminDashboard => "admin_dashboard",
      Self::AdminCats => "admin_cats",
      Self::NotFound => "not_found",
    }
  }

  pub fn identifier_source(self) -> Option<IdentifierSource> {
    match self {
      Self::CatDetail => Some(IdentifierSource { param: "id", select: Select::from("cats").columns(["id"]) }),
      Self::NewsArticle => Some(IdentifierSource {
        param: "slug",
        select: Select::from("news_posts").columns(["slug"]).eq("published", true),
      }),
      _ => None,
    }
  }

  pub fn requirements(self, params: &BTreeMap<String, String>) -> Vec<DataRequirement> {
    let param = |name: &str| params.get(name).cloned().unwrap_or_default();
    match self {
      Self::Home => vec![
        DataRequirement::many(
          QueryKey::new(["cats", "featured"]),
          "featured_cats",
          Select::from("cats")
            .columns(CAT_COLUMNS)
            .eq("status", "available")
            .order_desc("created_at")
            .limit(6),
        ),
        DataRequirement::many(
          QueryKey::new(["news", "latest"]),
          "latest_news",
          Select::from("news_posts")
            .columns(NEWS_COLUMNS)
            .eq("published", true)
            .order_desc("published_at")
            .limit(3),
        ),
      ],
      Self::CatList => vec![DataRequirement::many(
        QueryKey::new(["cats", "list"]),
        "cats",
        Select::from("cats").columns(CAT_COLUMNS).eq("status", "available").order_asc("name").limit(100),
      )],
      Self::CatDetail => {
        let id = param("id");
        vec![DataRequirement::one(
          QueryKey::new(["cat".to_string(), id.clone()]),
          "cat",
          Select::from("cats").columns(CAT_COLUMNS).eq("id", id),
          "cat",
        )]
      }
      Self::NewsList => vec![DataRequirement::many(
        QueryKey::new(["news", "list"]),
        "posts",
        Select::from("news_posts")
          .columns(NEWS_COLUMNS)
          .eq("published", true)
          .order_desc("published_at")
          .limit(50),
      )],
      Self::NewsArticle => {
        let slug = param("slug");
        vec![DataRequirement::one(
          QueryKey::new(["news".to_string(), slug.clone()]),
          "post",
          Select::from("news_posts").columns(NEWS_COLUMNS).eq("slug", slug).eq("published", true),
          "post",
        )]
      }
      Self::Transparency => vec![
        DataRequirement::many(
          QueryKey::new(["budgets"]),
          "budgets",
          Select::from("budgets").columns(["category", "amount"]).order_asc("category"),
        ),
        DataRequirement::many(
          QueryKey::new(["expenses"]),
          "expenses",
          Select::from("expenses")
            .columns(["category", "amount", "description", "spent_on"])
            .order_desc("spent_on"),
        ),
      ],
      Self::AdminDashboard => vec![DataRequirement::many(
        QueryKey::new(["admin", "applications"]),
        "applications",
        Select::from("adoption_applications")
          .columns(["id", "cat_id", "applicant_name", "email", "status", "created_at"])
          .eq("status", "pending")
          .order_desc("created_at")
          .limit(20),
      )],
      Self::AdminCats => vec![DataRequirement::many(
        QueryKey::new(["admin", "cats"]),
        "cats",
        Select::from("cats").columns(CAT_COLUMNS).order_asc("name"),
      )],
      Self::Donate | Self::SignIn | Self::NotFound => Vec::new(),
    }
  }
}

/// The site's route table, in match order.
pub fn route_table() -> Result<RouteTable<PageRoute>, RouteError> {
  RouteTable::new(PageKind::ALL.map(|kind| (kind.pattern(), PageRoute { kind, access: kind.access() })))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
  }

  #[test]
  fn table_builds_and_matches() {
    let table = route_table().unwrap();
    let hit = table.lookup("/cats/42").unwrap();
    assert_eq!(hit.route.target.kind, PageKind::CatDetail);
    assert_eq!(hit.params["id"], "42");
    assert_eq!(table.lookup("/admin/cats/").unwrap().route.target.access, Access::Protected(Role::Admin));
    assert_eq!(table.lookup("/nope/deeper").unwrap().route.target.kind, PageKind::NotFound);
  }

  #[test]
  fn detail_requirement_uses_param() {
    let reqs = PageKind::CatDetail.requirements(&params(&[("id", "42")]));
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].key, QueryKey::new(["cat", "42"]));
    assert_eq!(reqs[0].shape, Shape::One);
    assert_eq!(reqs[0].page_data, Some("cat"));
    assert_eq!(reqs[0].select.limit, Some(1));
  }

  #[test]
  fn keys_are_unique_per_page() {
    for kind in PageKind::ALL {
      let reqs = kind.requirements(&params(&[("id", "1"), ("slug", "s")]));
      let mut keys: Vec<_> = reqs.iter().map(|r| r.key.clone()).collect();
      keys.sort();
      keys.dedup();
      assert_eq!(keys.len(), reqs.len(), "{kind:?}");
    }
  }

  #[test]
  fn only_dynamic_routes_have_identifier_sources() {
    let table = route_table().unwrap();
    for route in table.routes() {
      assert_eq!(route.pattern.is_dynamic(), route.target.kind.identifier_source().is_some());
    }
    assert_eq!(PageKind::NewsArticle.identifier_source().unwrap().column(), "slug");
  }
}
