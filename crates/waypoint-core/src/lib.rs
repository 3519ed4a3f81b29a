//! waypoint-core: shared foundation for the waypoint scenario engine
//!
//! Provides:
//! - Scenario graph data model (scenarios, nodes, edges)
//! - Error types shared by all waypoint crates
//! - Environment configuration loading

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{Edge, Node, Scenario, ScenarioReport};
