//! waypoint-steps: pluggable step kinds for scenario playback
//!
//! Features:
//! - `StepHandler` contract (validate, render views, execute)
//! - Step registry with contained missing-handler dispatch
//! - Manifest and advisory capability metadata
//! - Built-in message, form and generation steps

pub mod builtin;
pub mod handler;
pub mod manifest;
pub mod registry;

pub use handler::{FormField, StepHandler, StepInput, StepView, Validation};
pub use manifest::{StepCapabilities, StepManifest};
pub use registry::StepRegistry;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::builtin::{EchoGenerator, FormStep, GenerationStep, MessageStep, TextGenerator};
    pub use super::handler::{StepHandler, StepInput, StepView, Validation};
    pub use super::manifest::{StepCapabilities, StepManifest};
    pub use super::registry::StepRegistry;
}
