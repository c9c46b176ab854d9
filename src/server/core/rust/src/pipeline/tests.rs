/* src/server/core/rust/src/pipeline/tests.rs */

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use purr_engine::{DocumentIds, Hydration, QueryKey};
use purr_gateway::{AuthUser, DataGateway, GatewayError, LazyGateway, MemoryGateway, StubGateway};
use serde_json::json;

use super::*;
use crate::templates::Templates;

fn shelter() -> MemoryGateway {
  MemoryGateway::new()
    .with_table(
      "cats",
      vec![
        json!({"id": "42", "name": "Mochi", "age": "2 years", "sex": "female", "status": "available", "created_at": "2026-03-01"}),
        json!({"id": "7", "name": "Tofu <b>", "status": "available", "created_at": "2026-02-01"}),
      ],
    )
    .with_table(
      "news_posts",
      vec![json!({"slug": "open-house", "title": "Open house", "published": true, "body": "<p>Come by!</p>"})],
    )
    .with_table(
      "adoption_applications",
      vec![json!({"id": 1, "cat_id": "42", "applicant_name": "Sam", "status": "pending"})],
    )
}

fn site_with(gateway: impl DataGateway + 'static) -> Site {
  Site::new(LazyGateway::ready(Arc::new(gateway))).unwrap()
}

/// Access token for `u-1`. The memory gateway keys users by the full token
/// string, so each test registers the token it builds.
fn token(exp: u64) -> String {
  let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
  let claims = URL_SAFE_NO_PAD.encode(json!({"sub": "u-1", "exp": exp}).to_string());
  format!("{header}.{claims}.c2ln")
}

fn title(html: &str) -> &str {
  let start = html.find("<title>").unwrap() + "<title>".len();
  let end = html[start..].find("</title>").unwrap() + start;
  &html[start..end]
}

fn page(outcome: RenderOutcome) -> (RenderStatus, String) {
  match outcome {
    RenderOutcome::Page { status, html } => (status, html),
    RenderOutcome::Redirect { location } => panic!("unexpected redirect to {location}"),
  }
}

#[tokio::test]
async fn cat_detail_page() {
  let site = site_with(shelter());
  let (status, html) = page(site.render_document("/cats/42").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert_eq!(title(&html), "Mochi | Purrhaven Rescue");
  assert_eq!(title(&html).matches("Mochi").count(), 1);
  assert!(html.contains("<h1>Mochi</h1>"));

  let hydration = Hydration::from_document(&html, &DocumentIds::default()).unwrap();
  assert_eq!(hydration.page_data["cat"]["id"], "42");
  assert_eq!(hydration.page_payload.unwrap()["cat"]["name"], "Mochi");
}

#[tokio::test]
async fn renders_are_deterministic_and_hydrate() {
  let gw = shelter();
  let mut expected = QueryCache::new();
  prefetch("/", &gw, &mut expected).await;

  let site = site_with(gw);
  let (_, first) = page(site.render_document("/").await.unwrap());
  let (_, second) = page(site.render_document("/").await.unwrap());
  assert_eq!(first, second);

  let hydration = Hydration::from_document(&first, &DocumentIds::default()).unwrap();
  assert_eq!(hydration.cache, expected);
  assert!(hydration.cache.contains(&QueryKey::new(["cats", "featured"])));
  assert!(hydration.cache.contains(&QueryKey::new(["news", "latest"])));
}

#[tokio::test]
async fn user_content_is_escaped() {
  let site = site_with(shelter());
  let (_, html) = page(site.render_document("/cats").await.unwrap());
  assert!(html.contains("Tofu &lt;b&gt;"));
  assert!(!html.contains("Tofu <b>"));
}

#[tokio::test]
async fn unknown_path_is_not_found() {
  let site = site_with(shelter());
  let (status, html) = page(site.render_request("/unknown-path", None).await.unwrap());
  assert_eq!(status, RenderStatus::NotFound);
  assert_eq!(status.http_status(), 404);
  assert!(html.contains("<h1>Page not found</h1>"));
}

#[tokio::test]
async fn missing_record_is_not_found() {
  let site = site_with(shelter());
  let (status, html) = page(site.render_document("/cats/999").await.unwrap());
  assert_eq!(status, RenderStatus::NotFound);
  assert_eq!(title(&html), "Cat not found | Purrhaven Rescue");
}

#[tokio::test]
async fn backend_outage_degrades_sections() {
  let site = site_with(StubGateway::new("gateway URL is not set"));
  let (status, html) = page(site.render_document("/").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert!(html.contains("temporarily unavailable"));
  let hydration = Hydration::from_document(&html, &DocumentIds::default()).unwrap();
  assert!(hydration.cache.is_empty());
}

#[tokio::test]
async fn empty_news_is_not_an_outage() {
  let gw = shelter();
  gw.set_table("news_posts", Vec::new());
  let site = site_with(gw);
  let (status, html) = page(site.render_document("/").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert!(html.contains("No news yet"));
  assert!(!html.contains("temporarily unavailable"));
}

#[tokio::test]
async fn news_links_encode_slugs() {
  let gw = shelter();
  gw.set_table(
    "news_posts",
    vec![json!({"slug": "open house?", "title": "Open house", "published": true, "body": ""})],
  );
  let site = site_with(gw);
  for path in ["/", "/news"] {
    let (_, html) = page(site.render_document(path).await.unwrap());
    assert!(html.contains(r#"href="/news/open%20house%3F""#), "{path}");
  }
}

#[tokio::test]
async fn failed_cat_read_is_unavailable_not_missing() {
  let gw = shelter();
  gw.fail_table("cats", GatewayError::transport("connection reset"));
  let site = site_with(gw);
  let (status, html) = page(site.render_document("/cats/42").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert_eq!(title(&html), "Cat temporarily unavailable | Purrhaven Rescue");
  assert!(html.contains("temporarily unavailable"));
  assert!(!html.contains("Cat not found"));
}

#[tokio::test]
async fn protected_pages_prerender_checking_shell() {
  let gw = shelter();
  gw.fail_table("adoption_applications", GatewayError::transport("must not be read"));
  let site = site_with(gw);
  let (status, html) = page(site.render_document("/admin").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert!(html.contains(r#"data-gate="checking""#));
  assert!(!html.contains("Sam"));
  let hydration = Hydration::from_document(&html, &DocumentIds::default()).unwrap();
  assert!(hydration.cache.is_empty());
}

#[tokio::test]
async fn anonymous_request_redirects_to_login() {
  let site = site_with(shelter());
  let outcome = site.render_request("/admin/cats?tab=all", None).await.unwrap();
  assert_eq!(outcome, RenderOutcome::Redirect { location: "/login?next=%2Fadmin%2Fcats".into() });
}

#[tokio::test]
async fn insufficient_role_redirects_home() {
  let gw = shelter();
  let tok = token(u64::MAX);
  gw.add_user(&tok, AuthUser { id: "u-1".into(), email: None, role: Some("user".into()), expires_at: None });
  let site = site_with(gw);
  let outcome = site.render_request("/admin", Some(&tok)).await.unwrap();
  assert_eq!(outcome, RenderOutcome::Redirect { location: "/".into() });
}

#[tokio::test]
async fn admin_sees_dashboard() {
  let gw = shelter();
  let tok = token(u64::MAX);
  gw.add_user(&tok, AuthUser { id: "u-1".into(), email: Some("staff@purrhaven.org".into()), role: Some("admin".into()), expires_at: None });
  let site = site_with(gw);
  let (status, html) = page(site.render_request("/admin", Some(&tok)).await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert!(html.contains("<td>Sam</td>"));
  assert!(html.contains("staff@purrhaven.org"));
}

#[tokio::test]
async fn unreachable_auth_service_shows_gate_error() {
  let site = site_with(StubGateway::new("offline"));
  let (status, html) = page(site.render_request("/admin", Some(&token(u64::MAX))).await.unwrap());
  assert_eq!(status, RenderStatus::Unavailable);
  assert_eq!(status.http_status(), 503);
  assert!(html.contains("could not reach the sign-in service"));
  assert!(!html.contains("Pending applications"));
}

#[tokio::test]
async fn render_failure_falls_back_to_error_boundary() {
  let mut templates = Templates::builtin().unwrap();
  templates.set.insert("cat_list", "<!--purr:include:cat_list-->").unwrap();
  let site = site_with(shelter()).templates(templates).unwrap();
  let (status, html) = page(site.render_document("/cats").await.unwrap());
  assert_eq!(status, RenderStatus::Ok);
  assert!(html.contains("<h1>Something went wrong</h1>"));
  assert!(html.contains("__PURR_STATE__"));
}

#[tokio::test]
async fn broken_shell_propagates() {
  let mut templates = Templates::builtin().unwrap();
  templates.shell = "<html><body></body></html>".into();
  let site = site_with(shelter()).templates(templates).unwrap();
  let err = site.render_document("/").await.unwrap_err();
  assert_eq!(err.code(), "DOCUMENT_ERROR");
}

#[test]
fn paths_normalize() {
  assert_eq!(normalize_path("/cats/42/?x=1#top"), "/cats/42");
  assert_eq!(normalize_path("/"), "/");
  assert_eq!(normalize_path(""), "/");
}
