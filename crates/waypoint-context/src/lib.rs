//! waypoint-context: shared, path-addressable context for scenario runs
//!
//! Features:
//! - Pure dotted-path get/set over JSON trees
//! - Workspace-scoped key/value entries (text or JSON)
//! - Nested step-result merging under one top-level key
//! - `{{token}}` template interpolation

pub mod path;
pub mod store;

pub use path::{get_by_path, set_by_path};
pub use store::{ContextEntry, ContextStore, ValueKind};
