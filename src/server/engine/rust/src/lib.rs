/* src/server/engine/rust/src/lib.rs */

//! Pure rendering logic shared by the server, the CLI and the browser
//! bindings. Nothing here performs I/O.

pub mod cache;
pub mod document;
pub mod escape;
pub mod gate;
pub mod hydrate;
pub mod route;

pub use cache::{DehydratedQuery, EntryStatus, PageState, QueryCache, QueryEntry, QueryKey};
pub use document::{
  DEFAULT_SHELL, DocumentConfig, DocumentError, DocumentIds, DocumentParts, assemble, data_script,
};
pub use escape::escape_script_json;
pub use gate::{AuthGate, GateState, RemoteCheck, Role, Session};
pub use hydrate::{HydrateError, Hydration, extract_script};
pub use route::{RouteDescriptor, RouteError, RouteMatch, RoutePattern, RouteTable};
