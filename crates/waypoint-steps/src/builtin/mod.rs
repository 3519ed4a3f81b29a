//! Built-in step kinds
//!
//! Provides the standard steps scenarios are authored from:
//! - Message steps (display, auto-advance)
//! - Form steps (user input with required-field gating)
//! - Generation steps (await an external text generator)

pub mod generate;

pub use generate::{EchoGenerator, GenerationStep, TextGenerator};

use async_trait::async_trait;
use serde_json::{json, Value};

use waypoint_core::Node;

use crate::handler::{FormField, StepHandler, StepInput, StepView, Validation};
use crate::manifest::{StepCapabilities, StepManifest};

/// Display step: shows its rendered message and advances without input
pub struct MessageStep;

#[async_trait]
impl StepHandler for MessageStep {
    fn manifest(&self) -> StepManifest {
        StepManifest::new("message", "Message", "display")
            .with_default_config(json!({}))
            .with_capabilities(StepCapabilities {
                auto_executable: true,
                requires_user_input: false,
                produces_output: true,
                consumes_output: true,
            })
    }

    fn view(&self, _node: &Node, input: &StepInput) -> StepView {
        StepView::Message {
            text: input.message.clone(),
        }
    }

    async fn execute(&self, _node: &Node, input: &StepInput) -> anyhow::Result<Value> {
        Ok(json!({ "message": input.message }))
    }
}

/// Input step: renders declared fields and blocks advancement until every
/// required field is present in the submission
pub struct FormStep;

impl FormStep {
    fn fields(node: &Node) -> Vec<FormField> {
        node.attrs
            .get("fields")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    fn is_blank(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        }
    }
}

#[async_trait]
impl StepHandler for FormStep {
    fn manifest(&self) -> StepManifest {
        StepManifest::new("form", "Form", "input")
            .with_default_config(json!({ "fields": [] }))
            .with_capabilities(StepCapabilities {
                auto_executable: false,
                requires_user_input: true,
                produces_output: true,
                consumes_output: false,
            })
    }

    fn validate(&self, node: &Node, input: &StepInput) -> Validation {
        let mut errors = Vec::new();
        for field in Self::fields(node) {
            if field.required && Self::is_blank(input.submission.get(&field.name)) {
                errors.push(format!("Field '{}' is required", field.name));
            }
        }
        if errors.is_empty() {
            Validation::ok()
        } else {
            Validation::fail(errors)
        }
    }

    fn view(&self, node: &Node, input: &StepInput) -> StepView {
        StepView::Form {
            prompt: input.message.clone(),
            fields: Self::fields(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_node() -> Node {
        Node::new("ask", "form").with_attrs(json!({
            "fields": [
                { "name": "answer", "label": "Answer", "required": true },
                { "name": "notes", "label": "Notes" }
            ]
        }))
    }

    #[tokio::test]
    async fn message_step_echoes_rendered_message() {
        let node = Node::new("hello", "message");
        let input = StepInput::new("Hi Ann", Value::Null);

        let result = MessageStep.execute(&node, &input).await.unwrap();
        assert_eq!(result, json!({ "message": "Hi Ann" }));
        assert_eq!(
            MessageStep.view(&node, &input),
            StepView::Message {
                text: "Hi Ann".to_string()
            }
        );
    }

    #[test]
    fn form_blocks_on_missing_required_field() {
        let node = form_node();
        let input = StepInput::default().with_submission(json!({ "notes": "hi" }));

        let validation = FormStep.validate(&node, &input);
        assert!(!validation.valid);
        assert_eq!(validation.errors, vec!["Field 'answer' is required"]);
    }

    #[test]
    fn form_treats_blank_strings_as_missing() {
        let node = form_node();
        let input = StepInput::default().with_submission(json!({ "answer": "  " }));
        assert!(!FormStep.validate(&node, &input).valid);
    }

    #[test]
    fn form_passes_when_required_fields_present() {
        let node = form_node();
        let input = StepInput::default().with_submission(json!({ "answer": "x" }));
        assert!(FormStep.validate(&node, &input).valid);
    }

    #[test]
    fn form_without_declared_fields_is_valid() {
        let node = Node::new("free", "form");
        assert!(FormStep.validate(&node, &StepInput::default()).valid);
    }

    #[test]
    fn form_view_lists_declared_fields() {
        let node = form_node();
        let view = FormStep.view(&node, &StepInput::new("Fill this in", Value::Null));
        match view {
            StepView::Form { prompt, fields } => {
                assert_eq!(prompt, "Fill this in");
                assert_eq!(fields.len(), 2);
                assert!(fields[0].required);
                assert!(!fields[1].required);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
