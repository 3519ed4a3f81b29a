//! Generation step: awaits an external text generator
//!
//! The generator is a collaborator injected at construction. Call
//! failures surface as the handler's own error and are contained by the
//! controller; re-invoking the step repeats the same call, there is no
//! automatic retry.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use waypoint_core::Node;

use crate::handler::{StepHandler, StepInput, StepView};
use crate::manifest::{StepCapabilities, StepManifest};

/// External text generation collaborator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce text for an already-interpolated prompt
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Step that sends its rendered message to a [`TextGenerator`] and stores
/// the produced text as its result
pub struct GenerationStep {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationStep {
    /// Create a generation step backed by the given collaborator
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepHandler for GenerationStep {
    fn manifest(&self) -> StepManifest {
        StepManifest::new("generate", "Generate", "assist")
            .with_default_config(json!({}))
            .with_capabilities(StepCapabilities {
                auto_executable: true,
                requires_user_input: false,
                produces_output: true,
                consumes_output: true,
            })
    }

    fn view(&self, _node: &Node, input: &StepInput) -> StepView {
        StepView::Prompt {
            prompt: input.message.clone(),
        }
    }

    async fn execute(&self, node: &Node, input: &StepInput) -> anyhow::Result<Value> {
        debug!(node = %node.id, "Requesting generation");
        let text = self.generator.generate(&input.message).await?;
        Ok(json!({ "text": text }))
    }
}

/// Generator that echoes its prompt. Used by the runner and in tests
/// where no real backend is wired up.
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!("echo: {}", prompt))
    }
}
