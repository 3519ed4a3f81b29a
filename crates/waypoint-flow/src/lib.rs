//! waypoint-flow: scenario playback
//!
//! Features:
//! - Graph-to-path reduction over scenario definitions
//! - `FlowController` playback state machine
//! - `ScenarioEngine` registry and run factory

pub mod controller;
pub mod engine;
pub mod path;

pub use controller::{FlowController, FlowRunState, RunPhase, StepAdvance, StepRecord};
pub use engine::{FlowRun, ScenarioEngine};
pub use path::calculate_flow_path;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::controller::{FlowController, FlowRunState, RunPhase, StepAdvance};
    pub use super::engine::{FlowRun, ScenarioEngine};
    pub use super::path::calculate_flow_path;
    pub use waypoint_context::{ContextStore, ValueKind};
    pub use waypoint_core::{Edge, Node, Scenario};
    pub use waypoint_steps::StepRegistry;
}
