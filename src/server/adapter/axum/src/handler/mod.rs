/* src/server/adapter/axum/src/handler/mod.rs */

mod page;

pub use page::ACCESS_COOKIE;

use std::sync::Arc;

use axum::Router;
use purr_server::Site;

/// Every path falls through to the page renderer; the site's own route
/// table decides what exists.
pub(crate) fn build_router(site: Arc<Site>) -> Router {
  Router::new().fallback(page::handle_page).with_state(site)
}
