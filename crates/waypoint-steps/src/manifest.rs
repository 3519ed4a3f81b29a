//! Step kind metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Advisory capability flags for a step kind.
///
/// Consulted by controllers and editors to decide whether to show
/// navigation affordances or auto-advance; nothing enforces them
/// structurally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepCapabilities {
    /// The step can produce its result without user input
    pub auto_executable: bool,
    /// The step blocks until the user submits something
    pub requires_user_input: bool,
    /// The step writes a result into the context
    pub produces_output: bool,
    /// The step reads context produced by earlier steps
    pub consumes_output: bool,
}

impl Default for StepCapabilities {
    fn default() -> Self {
        Self {
            auto_executable: false,
            requires_user_input: true,
            produces_output: true,
            consumes_output: false,
        }
    }
}

/// Step kind metadata, registered once at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepManifest {
    /// Step kind identifier, matched against `Node::kind`
    pub id: String,
    /// Display name
    pub name: String,
    /// Category for editor palettes
    pub category: String,
    /// Default per-node configuration seeded by editors
    #[serde(default)]
    pub default_config: Value,
    /// Advisory capability flags
    #[serde(default)]
    pub capabilities: StepCapabilities,
}

impl StepManifest {
    /// Create a manifest with default capabilities
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            default_config: Value::Null,
            capabilities: StepCapabilities::default(),
        }
    }

    /// Set the default per-node configuration
    pub fn with_default_config(mut self, config: Value) -> Self {
        self.default_config = config;
        self
    }

    /// Set capability flags
    pub fn with_capabilities(mut self, capabilities: StepCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}
