//! Step handler contract
//!
//! A step kind is implemented by a [`StepHandler`]: validate gates
//! advancement, the view methods produce render models for a host UI, and
//! `execute` produces a result for auto-executable kinds. Handlers are
//! explicit service objects registered with a [`crate::StepRegistry`];
//! there is no global handler state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use waypoint_core::Node;

use crate::manifest::StepManifest;

/// Input assembled for one step activation
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    /// Assistant message with `{{token}}`s already resolved
    pub message: String,
    /// Snapshot of the workspace context
    pub context: Value,
    /// Result submitted for the current step, pending validation.
    /// `Null` while the step is only being rendered.
    pub submission: Value,
}

impl StepInput {
    /// Build an input for rendering (no pending submission)
    pub fn new(message: impl Into<String>, context: Value) -> Self {
        Self {
            message: message.into(),
            context,
            submission: Value::Null,
        }
    }

    /// Attach a pending submission for validation
    pub fn with_submission(mut self, submission: Value) -> Self {
        self.submission = submission;
        self
    }
}

/// Outcome of a handler's validation pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Validation {
    /// A passing validation
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing validation carrying inline messages
    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Declarative form field read from node attrs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

/// Render model handed to a host UI.
///
/// A tagged enum instead of opaque component references: hosts match on
/// the variant and render however they like.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StepView {
    /// Read-only message display
    Message { text: String },
    /// Form awaiting user input
    Form { prompt: String, fields: Vec<FormField> },
    /// Prompt handed to a generation collaborator
    Prompt { prompt: String },
    /// Completed step's read view
    Result { value: Value },
    /// Configuration editor view
    Editor { config: Value },
    /// Contained "no handler registered for this kind" state
    Missing { kind: String },
}

/// Behavior for one step kind
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Metadata for this step kind
    fn manifest(&self) -> StepManifest;

    /// Gate advancement past this step. The default is always-valid;
    /// field-level semantics live entirely inside the handler.
    fn validate(&self, _node: &Node, _input: &StepInput) -> Validation {
        Validation::ok()
    }

    /// Interactive display view
    fn view(&self, node: &Node, input: &StepInput) -> StepView;

    /// Completed step's read view
    fn result_view(&self, _node: &Node, result: &Value) -> StepView {
        StepView::Result {
            value: result.clone(),
        }
    }

    /// Configuration editor view
    fn editor_view(&self, node: &Node) -> StepView {
        StepView::Editor {
            config: node.attrs.clone(),
        }
    }

    /// Produce this step's result without user input. Only meaningful for
    /// auto-executable kinds; errors are contained by the caller, never
    /// propagated through the run.
    async fn execute(&self, node: &Node, _input: &StepInput) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!(
            "Step kind '{}' does not execute automatically",
            node.kind
        ))
    }
}
