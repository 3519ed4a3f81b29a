//! Flow navigation controller
//!
//! The playback state machine for one run: it walks the computed step
//! sequence, resolves message templates against the context store, gates
//! advancement on handler validation, and merges step results back into
//! the context. Handler failures are contained as advance outcomes; the
//! controller never propagates them as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use waypoint_context::ContextStore;
use waypoint_core::{Node, Result};
use waypoint_steps::{StepInput, StepRegistry, StepView};

/// Playback phase of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No active run
    #[default]
    Idle,
    /// A run is in progress
    Playing,
    /// The last step finished
    Completed,
}

/// Outcome of one navigation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAdvance {
    /// Moved to the next step
    Advanced,
    /// The last step finished; the run is complete
    Completed,
    /// Validation failed; the run stays on the current step
    Blocked(Vec<String>),
    /// Execution failed; the run stays on the current step and a manual
    /// re-invocation repeats the call
    Faulted(String),
    /// No active run; the call was ignored
    Idle,
}

/// Serializable view of a run's transient state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRunState {
    pub is_playing: bool,
    pub steps: Vec<Node>,
    pub current_step_index: usize,
}

/// One recorded playback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub node_id: String,
    pub at: DateTime<Utc>,
    pub outcome: String,
}

/// Playback state machine over a computed path
pub struct FlowController {
    registry: Arc<StepRegistry>,
    context: ContextStore,
    workspace: String,
    steps: Vec<Node>,
    current: usize,
    phase: RunPhase,
    history: Vec<StepRecord>,
}

impl FlowController {
    /// Create an idle controller bound to a workspace
    pub fn new(registry: Arc<StepRegistry>, context: ContextStore, workspace: &str) -> Self {
        Self {
            registry,
            context,
            workspace: workspace.to_string(),
            steps: Vec::new(),
            current: 0,
            phase: RunPhase::Idle,
            history: Vec::new(),
        }
    }

    /// Begin playback over a computed path. An empty path is ignored and
    /// the controller stays idle.
    pub fn start(&mut self, path: Vec<Node>) {
        if path.is_empty() {
            debug!(workspace = %self.workspace, "start() ignored: empty path");
            return;
        }
        info!(workspace = %self.workspace, steps = path.len(), "Starting run");
        self.steps = path;
        self.current = 0;
        self.phase = RunPhase::Playing;
        self.history.clear();
    }

    /// Current playback phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// True while a run is in progress
    pub fn is_playing(&self) -> bool {
        self.phase == RunPhase::Playing
    }

    /// Index of the active step
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The active step, if a run is in progress
    pub fn current_step(&self) -> Option<&Node> {
        if self.phase == RunPhase::Playing {
            self.steps.get(self.current)
        } else {
            None
        }
    }

    /// Workspace this run writes into
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Recorded playback events
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    /// Render model for the active step
    pub async fn view_current(&self) -> Option<StepView> {
        let node = self.current_step()?.clone();
        let input = self.input_for(&node).await;
        Some(self.registry.view_step(&node, &input).await)
    }

    /// Submit a result for the active step and advance.
    ///
    /// The step's handler must report the submission valid; a failing
    /// validation returns [`StepAdvance::Blocked`] and leaves both the
    /// run position and the context untouched. A valid result is merged
    /// into the context at the node's context path, then the run either
    /// advances or, on the last step, completes without moving the index
    /// past the end.
    pub async fn next(&mut self, result: Value) -> Result<StepAdvance> {
        if self.phase != RunPhase::Playing {
            debug!(workspace = %self.workspace, "next() ignored: no active run");
            return Ok(StepAdvance::Idle);
        }

        let node = self.steps[self.current].clone();
        let input = self
            .input_for(&node)
            .await
            .with_submission(result.clone());

        let validation = self.registry.validate_step(&node, &input).await;
        if !validation.valid {
            debug!(node = %node.id, errors = validation.errors.len(), "Step blocked by validation");
            self.record(&node.id, "blocked");
            return Ok(StepAdvance::Blocked(validation.errors));
        }

        if let Some(path) = &node.context_path {
            self.context
                .update_by_path(&self.workspace, path, result)
                .await?;
        }

        if self.current + 1 < self.steps.len() {
            self.current += 1;
            self.record(&node.id, "advanced");
            Ok(StepAdvance::Advanced)
        } else {
            self.phase = RunPhase::Completed;
            self.record(&node.id, "completed");
            info!(workspace = %self.workspace, steps = self.steps.len(), "Run completed");
            Ok(StepAdvance::Completed)
        }
    }

    /// Step back. A no-op at index 0; callers treat that boundary as
    /// "cancel". Never touches the context store.
    pub fn prev(&mut self) -> bool {
        if self.phase == RunPhase::Playing && self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Force-end the run without marking completion, discarding transient
    /// run state. A step result that arrives after `stop()` is dropped,
    /// because `next()` no longer has an active run to apply it to.
    pub fn stop(&mut self) {
        if self.phase == RunPhase::Playing {
            info!(workspace = %self.workspace, "Run stopped");
        }
        self.phase = RunPhase::Idle;
        self.steps.clear();
        self.current = 0;
        self.history.clear();
    }

    /// Execute the active step through its handler and advance with the
    /// produced result. Handler failures are contained as
    /// [`StepAdvance::Faulted`]; the run stays actionable on the same step.
    pub async fn execute_current(&mut self) -> Result<StepAdvance> {
        if self.phase != RunPhase::Playing {
            return Ok(StepAdvance::Idle);
        }

        let node = self.steps[self.current].clone();
        let Some(handler) = self.registry.get(&node.kind).await else {
            warn!(kind = %node.kind, node = %node.id, "No handler registered to execute step");
            self.record(&node.id, "faulted");
            return Ok(StepAdvance::Faulted(format!(
                "No handler registered for step kind '{}'",
                node.kind
            )));
        };

        let input = self.input_for(&node).await;
        match handler.execute(&node, &input).await {
            Ok(result) => self.next(result).await,
            Err(e) => {
                warn!(node = %node.id, error = %e, "Step execution failed");
                self.record(&node.id, "faulted");
                Ok(StepAdvance::Faulted(e.to_string()))
            }
        }
    }

    /// Serializable snapshot of the run
    pub fn snapshot(&self) -> FlowRunState {
        FlowRunState {
            is_playing: self.phase == RunPhase::Playing,
            steps: self.steps.clone(),
            current_step_index: self.current,
        }
    }

    async fn input_for(&self, node: &Node) -> StepInput {
        let message = self
            .context
            .interpolate(&self.workspace, &node.assistant_message)
            .await;
        let snapshot = self.context.snapshot(&self.workspace).await;
        StepInput::new(message, snapshot)
    }

    fn record(&mut self, node_id: &str, outcome: &str) {
        self.history.push(StepRecord {
            node_id: node_id.to_string(),
            at: Utc::now(),
            outcome: outcome.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use waypoint_steps::prelude::*;

    async fn controller() -> FlowController {
        let registry = Arc::new(StepRegistry::new());
        registry.register(Arc::new(MessageStep)).await;
        FlowController::new(registry, ContextStore::new(), "ws")
    }

    fn path(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(id, "message")).collect()
    }

    #[tokio::test]
    async fn empty_path_is_ignored() {
        let mut ctrl = controller().await;
        ctrl.start(Vec::new());
        assert_eq!(ctrl.phase(), RunPhase::Idle);
        assert_eq!(ctrl.next(json!(null)).await.unwrap(), StepAdvance::Idle);
    }

    #[tokio::test]
    async fn next_advances_then_completes_without_overrun() {
        let mut ctrl = controller().await;
        ctrl.start(path(&["a", "b"]));

        assert_eq!(ctrl.next(json!(1)).await.unwrap(), StepAdvance::Advanced);
        assert_eq!(ctrl.current_index(), 1);

        assert_eq!(ctrl.next(json!(2)).await.unwrap(), StepAdvance::Completed);
        assert!(!ctrl.is_playing());
        assert_eq!(ctrl.snapshot().current_step_index, 1);
    }

    #[tokio::test]
    async fn prev_is_a_noop_at_index_zero() {
        let mut ctrl = controller().await;
        ctrl.start(path(&["a", "b"]));

        assert!(!ctrl.prev());
        assert_eq!(ctrl.current_index(), 0);

        ctrl.next(json!(null)).await.unwrap();
        assert!(ctrl.prev());
        assert!(!ctrl.prev());
        assert_eq!(ctrl.current_index(), 0);
    }

    #[tokio::test]
    async fn stop_discards_run_state() {
        let mut ctrl = controller().await;
        ctrl.start(path(&["a", "b"]));
        ctrl.next(json!(null)).await.unwrap();

        ctrl.stop();
        assert_eq!(ctrl.phase(), RunPhase::Idle);
        assert!(ctrl.snapshot().steps.is_empty());

        // A result arriving after stop() is dropped.
        assert_eq!(ctrl.next(json!("late")).await.unwrap(), StepAdvance::Idle);
    }

    #[tokio::test]
    async fn view_current_renders_missing_state_for_unknown_kind() {
        let mut ctrl = controller().await;
        ctrl.start(vec![Node::new("x", "ghost")]);

        assert_eq!(
            ctrl.view_current().await,
            Some(StepView::Missing {
                kind: "ghost".to_string()
            })
        );
        // An unknown kind still validates, so the run can move past it.
        assert_eq!(ctrl.next(json!(null)).await.unwrap(), StepAdvance::Completed);
    }
}
