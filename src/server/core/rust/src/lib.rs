/* src/server/core/rust/src/lib.rs */

pub mod auth;
pub mod errors;
pub mod insights;
pub mod page;
pub mod pipeline;
pub mod prefetch;
pub mod resolve;
pub mod site;
pub mod templates;

pub use errors::SiteError;
pub use page::{Access, DataRequirement, IdentifierSource, PageKind, PageRoute, Shape, route_table};
pub use pipeline::{RenderOutcome, RenderStatus, normalize_path};
pub use prefetch::{PrefetchReport, SlotStatus, classify, prefetch};
pub use resolve::resolve_paths;
pub use site::{NavLink, Site, SiteMeta};
pub use templates::Templates;

/// Re-exports so adapters and the CLI need a single dependency.
pub use purr_engine;
pub use purr_gateway;
