//! waypoint-runner
//!
//! Loads a scenario definition from a JSON file, registers the built-in
//! step kinds, and plays the computed path to completion. Steps that
//! require user input take their submission from the node's
//! `attrs.sample_input`, so authored scenarios can be smoke-tested
//! non-interactively:
//!
//! ```text
//! waypoint-runner intro.json --workspace demo --set name=Ann --show-context
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use waypoint_context::{ContextStore, ValueKind};
use waypoint_core::config::{get_config, load_environment};
use waypoint_core::Scenario;
use waypoint_flow::{ScenarioEngine, StepAdvance};
use waypoint_steps::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "waypoint-runner")]
#[command(about = "Load a scenario definition and play it to completion")]
struct Args {
    /// Path to a scenario JSON file
    scenario: PathBuf,

    /// Workspace the run writes into
    #[arg(short, long, default_value = "default")]
    workspace: String,

    /// Seed a text context entry before the run (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    seed: Vec<String>,

    /// Print the final context entries after the run
    #[arg(long)]
    show_context: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_environment();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(get_config(
            "WAYPOINT_LOG",
            "info",
        )))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let raw = tokio::fs::read_to_string(&args.scenario)
        .await
        .with_context(|| format!("Failed to read {}", args.scenario.display()))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).context("Scenario file is not a valid definition")?;

    let registry = Arc::new(StepRegistry::new());
    registry.register(Arc::new(MessageStep)).await;
    registry.register(Arc::new(FormStep)).await;
    registry
        .register(Arc::new(GenerationStep::new(Arc::new(EchoGenerator))))
        .await;

    let context = ContextStore::new();
    for pair in &args.seed {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("--set expects KEY=VALUE, got '{}'", pair))?;
        context.add(&args.workspace, key, value, ValueKind::Text).await;
    }

    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());
    let scenario_id = scenario.id.clone();
    engine.register(scenario).await?;

    let mut run = engine.start_run(&scenario_id, &args.workspace).await?;
    info!(run_id = %run.id, "Playing scenario");

    while run.controller.is_playing() {
        let Some(node) = run.controller.current_step().cloned() else {
            break;
        };

        if let Some(view) = run.controller.view_current().await {
            print_view(&node.id, &view);
        }

        let auto = match registry.get(&node.kind).await {
            Some(handler) => handler.manifest().capabilities.auto_executable,
            None => false,
        };

        let advance = if auto {
            run.controller.execute_current().await?
        } else {
            let submission = node
                .attrs
                .get("sample_input")
                .cloned()
                .unwrap_or_else(|| json!({}));
            run.controller.next(submission).await?
        };

        match advance {
            StepAdvance::Advanced | StepAdvance::Completed => {}
            StepAdvance::Blocked(errors) => {
                anyhow::bail!("step '{}' blocked: {}", node.id, errors.join("; "))
            }
            StepAdvance::Faulted(message) => {
                anyhow::bail!("step '{}' faulted: {}", node.id, message)
            }
            StepAdvance::Idle => break,
        }
    }

    println!("--- run {} finished ---", run.id);
    for record in run.controller.history() {
        println!("{}  {:10}  {}", record.at.to_rfc3339(), record.outcome, record.node_id);
    }

    if args.show_context {
        println!("--- context ({}) ---", args.workspace);
        for entry in context.entries(&args.workspace).await {
            println!("{} [{:?}] = {}", entry.key, entry.kind, entry.value);
        }
    }

    Ok(())
}

fn print_view(node_id: &str, view: &StepView) {
    match view {
        StepView::Message { text } => println!("[{}] {}", node_id, text),
        StepView::Form { prompt, fields } => {
            println!("[{}] {} ({} fields)", node_id, prompt, fields.len())
        }
        StepView::Prompt { prompt } => println!("[{}] generating: {}", node_id, prompt),
        StepView::Missing { kind } => println!("[{}] no handler for kind '{}'", node_id, kind),
        StepView::Result { value } | StepView::Editor { config: value } => {
            println!("[{}] {}", node_id, value)
        }
    }
}
