//! End-to-end playback against the real registry, context store and
//! built-in step kinds.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use waypoint_flow::prelude::*;
use waypoint_steps::prelude::*;

async fn registry() -> Arc<StepRegistry> {
    let registry = Arc::new(StepRegistry::new());
    registry.register(Arc::new(MessageStep)).await;
    registry.register(Arc::new(FormStep)).await;
    registry
        .register(Arc::new(GenerationStep::new(Arc::new(EchoGenerator))))
        .await;
    registry
}

fn intro_scenario() -> Scenario {
    Scenario::new("intro", "Intro")
        .with_node(
            Node::new("a", "message")
                .with_message("Welcome {{name}}")
                .with_context_path("form.answer"),
        )
        .with_node(Node::new("b", "message"))
        .with_node(Node::new("c", "message"))
        .with_edge(Edge::new("a", "b"))
        .with_edge(Edge::new("b", "c"))
}

#[tokio::test]
async fn chain_plays_through_with_context_writes() {
    let registry = registry().await;
    let context = ContextStore::new();
    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());
    engine.register(intro_scenario()).await.unwrap();

    let mut run = engine.start_run("intro", "ws").await.unwrap();
    assert_eq!(run.controller.current_step().unwrap().id, "a");

    // Completing "a" merges the result under the top-level "form" entry.
    let advance = run.controller.next(json!("x")).await.unwrap();
    assert_eq!(advance, StepAdvance::Advanced);
    assert_eq!(run.controller.current_step().unwrap().id, "b");
    assert_eq!(
        context.get_json("ws", "form").await,
        Some(json!({ "answer": "x" }))
    );

    // Stepping back returns to "a" without touching the store.
    assert!(run.controller.prev());
    assert_eq!(run.controller.current_step().unwrap().id, "a");
    assert_eq!(
        context.get_json("ws", "form").await,
        Some(json!({ "answer": "x" }))
    );

    // Play through to completion; the index never overruns the path.
    run.controller.next(json!("x")).await.unwrap();
    run.controller.next(json!(null)).await.unwrap();
    let advance = run.controller.next(json!(null)).await.unwrap();
    assert_eq!(advance, StepAdvance::Completed);

    let state = run.controller.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.current_step_index, state.steps.len() - 1);
}

#[tokio::test]
async fn templates_resolve_against_earlier_step_output() {
    let registry = registry().await;
    let context = ContextStore::new();
    context.add("ws", "name", "Ann", ValueKind::Text).await;

    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());
    engine.register(intro_scenario()).await.unwrap();

    let run = engine.start_run("intro", "ws").await.unwrap();
    match run.controller.view_current().await {
        Some(StepView::Message { text }) => assert_eq!(text, "Welcome Ann"),
        other => panic!("unexpected view: {:?}", other),
    }
}

#[tokio::test]
async fn form_validation_blocks_until_required_fields_arrive() {
    let registry = registry().await;
    let context = ContextStore::new();
    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());

    let scenario = Scenario::new("ask", "Ask")
        .with_node(
            Node::new("q", "form")
                .with_context_path("form")
                .with_attrs(json!({
                    "fields": [{ "name": "answer", "label": "Answer", "required": true }]
                })),
        )
        .with_node(Node::new("done", "message"))
        .with_edge(Edge::new("q", "done"));
    engine.register(scenario).await.unwrap();

    let mut run = engine.start_run("ask", "ws").await.unwrap();

    let advance = run.controller.next(json!({})).await.unwrap();
    assert_eq!(
        advance,
        StepAdvance::Blocked(vec!["Field 'answer' is required".to_string()])
    );
    assert_eq!(run.controller.current_step().unwrap().id, "q");
    assert_eq!(context.get_json("ws", "form").await, None);

    let advance = run.controller.next(json!({ "answer": "42" })).await.unwrap();
    assert_eq!(advance, StepAdvance::Advanced);
    assert_eq!(
        context.get_json("ws", "form").await,
        Some(json!({ "answer": "42" }))
    );
}

struct FlakyGenerator;

#[async_trait]
impl TextGenerator for FlakyGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("upstream timeout"))
    }
}

#[tokio::test]
async fn generation_failure_is_contained_and_retryable() {
    let registry = Arc::new(StepRegistry::new());
    registry
        .register(Arc::new(GenerationStep::new(Arc::new(FlakyGenerator))))
        .await;

    let context = ContextStore::new();
    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());
    engine
        .register(
            Scenario::new("gen", "Gen")
                .with_node(Node::new("g", "generate").with_context_path("draft")),
        )
        .await
        .unwrap();

    let mut run = engine.start_run("gen", "ws").await.unwrap();

    let advance = run.controller.execute_current().await.unwrap();
    assert_eq!(
        advance,
        StepAdvance::Faulted("upstream timeout".to_string())
    );
    // The run stays actionable on the same step; retrying repeats the call.
    assert!(run.controller.is_playing());
    assert_eq!(run.controller.current_index(), 0);
    assert!(matches!(
        run.controller.execute_current().await.unwrap(),
        StepAdvance::Faulted(_)
    ));

    // Swapping in a working generator under the same kind id lets the
    // same run finish.
    registry
        .register(Arc::new(GenerationStep::new(Arc::new(EchoGenerator))))
        .await;
    let advance = run.controller.execute_current().await.unwrap();
    assert_eq!(advance, StepAdvance::Completed);
    assert_eq!(
        context.get_json("ws", "draft").await,
        Some(json!({ "text": "echo: " }))
    );
}

#[tokio::test]
async fn auto_execution_walks_message_steps() {
    let registry = registry().await;
    let context = ContextStore::new();
    let engine = ScenarioEngine::new(Arc::clone(&registry), context.clone());
    engine.register(intro_scenario()).await.unwrap();

    let mut run = engine.start_run("intro", "ws").await.unwrap();
    while run.controller.is_playing() {
        let advance = run.controller.execute_current().await.unwrap();
        assert!(matches!(
            advance,
            StepAdvance::Advanced | StepAdvance::Completed
        ));
    }

    assert_eq!(
        context.get_json("ws", "form").await,
        Some(json!({ "answer": { "message": "Welcome {{name}}" } }))
    );
}
