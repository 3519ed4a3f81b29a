//! Scenario engine
//!
//! Owns the registered scenario definitions and the shared services
//! (step registry, context store), and produces playback runs. Scenarios
//! are validated on registration; branch warnings are logged but do not
//! reject the definition.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use waypoint_context::ContextStore;
use waypoint_core::{Error, Result, Scenario, ScenarioReport};
use waypoint_steps::StepRegistry;

use crate::controller::FlowController;
use crate::path::calculate_flow_path;

/// One playback run produced by the engine
pub struct FlowRun {
    /// Unique run identifier
    pub id: Uuid,
    /// Scenario this run plays
    pub scenario_id: String,
    /// Workspace the run writes into
    pub workspace: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// The playback state machine
    pub controller: FlowController,
}

impl std::fmt::Debug for FlowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowRun")
            .field("id", &self.id)
            .field("scenario_id", &self.scenario_id)
            .field("workspace", &self.workspace)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Scenario registry and run factory
pub struct ScenarioEngine {
    scenarios: Arc<RwLock<HashMap<String, Scenario>>>,
    registry: Arc<StepRegistry>,
    context: ContextStore,
}

impl ScenarioEngine {
    /// Create an engine over the given services
    pub fn new(registry: Arc<StepRegistry>, context: ContextStore) -> Self {
        Self {
            scenarios: Arc::new(RwLock::new(HashMap::new())),
            registry,
            context,
        }
    }

    /// The step registry runs dispatch against
    pub fn registry(&self) -> Arc<StepRegistry> {
        Arc::clone(&self.registry)
    }

    /// The shared context store
    pub fn context(&self) -> ContextStore {
        self.context.clone()
    }

    /// Validate and register a scenario definition. Structural errors
    /// reject the scenario; branch findings are logged and accepted.
    pub async fn register(&self, scenario: Scenario) -> Result<ScenarioReport> {
        let report = scenario.validate()?;
        for node_id in &report.branch_nodes {
            warn!(
                scenario_id = %scenario.id,
                node = %node_id,
                "Node has multiple outgoing edges; playback flattens branches to one sequence"
            );
        }

        let mut scenarios = self.scenarios.write().await;
        info!(scenario_id = %scenario.id, nodes = scenario.nodes.len(), "Registering scenario");
        scenarios.insert(scenario.id.clone(), scenario);
        Ok(report)
    }

    /// Get a scenario definition
    pub async fn get(&self, scenario_id: &str) -> Option<Scenario> {
        let scenarios = self.scenarios.read().await;
        scenarios.get(scenario_id).cloned()
    }

    /// List registered scenarios, sorted by id
    pub async fn list(&self) -> Vec<Scenario> {
        let scenarios = self.scenarios.read().await;
        let mut all: Vec<Scenario> = scenarios.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Remove a scenario definition
    pub async fn remove(&self, scenario_id: &str) -> Result<()> {
        let mut scenarios = self.scenarios.write().await;
        scenarios
            .remove(scenario_id)
            .ok_or_else(|| Error::not_found(format!("Scenario '{}' not found", scenario_id)))?;
        Ok(())
    }

    /// Compute a scenario's path and start a playback run over it.
    ///
    /// A scenario whose computed path is empty produces a run whose
    /// controller stays idle, mirroring `start()` on an empty path.
    pub async fn start_run(&self, scenario_id: &str, workspace: &str) -> Result<FlowRun> {
        let scenario = self
            .get(scenario_id)
            .await
            .ok_or_else(|| Error::not_found(format!("Scenario '{}' not found", scenario_id)))?;

        let path = calculate_flow_path(&scenario);
        let id = Uuid::new_v4();
        info!(
            run_id = %id,
            scenario_id = %scenario_id,
            workspace = %workspace,
            steps = path.len(),
            "Starting scenario run"
        );

        let mut controller =
            FlowController::new(Arc::clone(&self.registry), self.context.clone(), workspace);
        controller.start(path);

        Ok(FlowRun {
            id,
            scenario_id: scenario_id.to_string(),
            workspace: workspace.to_string(),
            started_at: Utc::now(),
            controller,
        })
    }
}
