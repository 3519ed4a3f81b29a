//! Step handler registry
//!
//! Maps step kind identifiers to handler instances. Dispatch helpers
//! contain the "no handler for this kind" case as a rendered state so one
//! unknown step type cannot abort a run.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use waypoint_core::Node;

use crate::handler::{StepHandler, StepInput, StepView, Validation};
use crate::manifest::StepManifest;

/// Registry of step handlers, keyed by manifest id
#[derive(Default)]
pub struct StepRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn StepHandler>>>,
}

impl StepRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a handler under its manifest id. Registering
    /// the same handler twice is harmless.
    pub async fn register(&self, handler: Arc<dyn StepHandler>) {
        let id = handler.manifest().id;
        let mut handlers = self.handlers.write().await;
        info!(kind = %id, "Registering step handler");
        handlers.insert(id, handler);
    }

    /// Look up a handler by step kind
    pub async fn get(&self, kind: &str) -> Option<Arc<dyn StepHandler>> {
        let handlers = self.handlers.read().await;
        handlers.get(kind).cloned()
    }

    /// Manifests of every registered kind, sorted by id
    pub async fn manifests(&self) -> Vec<StepManifest> {
        let handlers = self.handlers.read().await;
        let mut manifests: Vec<StepManifest> =
            handlers.values().map(|h| h.manifest()).collect();
        manifests.sort_by(|a, b| a.id.cmp(&b.id));
        manifests
    }

    /// Number of registered kinds
    pub async fn count(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers.len()
    }

    /// Validate a node against its handler. A missing handler, like a
    /// handler without a validate override, gates nothing.
    pub async fn validate_step(&self, node: &Node, input: &StepInput) -> Validation {
        match self.get(&node.kind).await {
            Some(handler) => handler.validate(node, input),
            None => {
                debug!(kind = %node.kind, node = %node.id, "No handler registered, treating step as valid");
                Validation::ok()
            }
        }
    }

    /// Render a node's interactive view, or a contained missing state
    pub async fn view_step(&self, node: &Node, input: &StepInput) -> StepView {
        match self.get(&node.kind).await {
            Some(handler) => handler.view(node, input),
            None => StepView::Missing {
                kind: node.kind.clone(),
            },
        }
    }

    /// Render a completed node's read view, or a contained missing state
    pub async fn result_view_step(&self, node: &Node, result: &Value) -> StepView {
        match self.get(&node.kind).await {
            Some(handler) => handler.result_view(node, result),
            None => StepView::Missing {
                kind: node.kind.clone(),
            },
        }
    }

    /// Render a node's configuration editor view, or a contained missing
    /// state
    pub async fn editor_view_step(&self, node: &Node) -> StepView {
        match self.get(&node.kind).await {
            Some(handler) => handler.editor_view(node),
            None => StepView::Missing {
                kind: node.kind.clone(),
            },
        }
    }
}
