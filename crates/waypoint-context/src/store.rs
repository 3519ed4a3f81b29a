//! Workspace-scoped context store
//!
//! Each workspace owns a flat set of named entries. An entry holds either
//! raw text or a JSON document serialized as text. Step results are merged
//! into entries through dotted paths, and message templates are rendered
//! by substituting `{{key}}` tokens with entry values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use waypoint_core::{Error, Result};

use crate::path::set_by_path;

/// How an entry's text value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Raw text, substituted verbatim
    #[default]
    Text,
    /// JSON document stored as text
    Json,
}

/// One named value owned by a workspace context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEntry {
    pub key: String,
    pub value: String,
    pub kind: ValueKind,
}

/// Shared, workspace-scoped key/value store
#[derive(Clone, Default)]
pub struct ContextStore {
    workspaces: Arc<RwLock<HashMap<String, HashMap<String, ContextEntry>>>>,
}

impl ContextStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    pub async fn add(&self, workspace: &str, key: &str, value: &str, kind: ValueKind) {
        let mut workspaces = self.workspaces.write().await;
        let entries = workspaces.entry(workspace.to_string()).or_default();
        entries.insert(
            key.to_string(),
            ContextEntry {
                key: key.to_string(),
                value: value.to_string(),
                kind,
            },
        );
    }

    /// Update an existing entry. Fails without side effects when the key
    /// is absent.
    pub async fn update(&self, workspace: &str, key: &str, value: &str, kind: ValueKind) -> Result<()> {
        let mut workspaces = self.workspaces.write().await;
        let entry = workspaces
            .get_mut(workspace)
            .and_then(|entries| entries.get_mut(key))
            .ok_or_else(|| Error::not_found(format!("Context entry '{}' not found", key)))?;
        entry.value = value.to_string();
        entry.kind = kind;
        Ok(())
    }

    /// Remove an entry
    pub async fn remove(&self, workspace: &str, key: &str) -> Result<()> {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .get_mut(workspace)
            .and_then(|entries| entries.remove(key))
            .ok_or_else(|| Error::not_found(format!("Context entry '{}' not found", key)))?;
        Ok(())
    }

    /// Get an entry's raw text value
    pub async fn get(&self, workspace: &str, key: &str) -> Option<String> {
        let workspaces = self.workspaces.read().await;
        workspaces
            .get(workspace)
            .and_then(|entries| entries.get(key))
            .map(|e| e.value.clone())
    }

    /// Get an entry parsed as JSON.
    ///
    /// A parse failure is logged and reported as `None` rather than an
    /// error, so one malformed entry cannot take down a caller.
    pub async fn get_json(&self, workspace: &str, key: &str) -> Option<Value> {
        let raw = self.get(workspace, key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(workspace = %workspace, key = %key, error = %e, "Context entry is not valid JSON");
                None
            }
        }
    }

    /// Merge `value` into the context at a dotted path.
    ///
    /// The first segment names the entry key; the remaining segments are
    /// applied to that entry's JSON document (an empty object when the
    /// entry is absent or unparseable). The merged document is written
    /// back as a single JSON entry. The read-compute-write happens as one
    /// pure transform inside a single lock scope.
    pub async fn update_by_path(&self, workspace: &str, path: &str, value: Value) -> Result<()> {
        if path.is_empty() {
            debug!(workspace = %workspace, "Ignoring context write with empty path");
            return Ok(());
        }

        let (key, rest) = match path.split_once('.') {
            Some((key, rest)) => (key, rest),
            None => (path, ""),
        };

        let mut workspaces = self.workspaces.write().await;
        let entries = workspaces.entry(workspace.to_string()).or_default();

        let merged = if rest.is_empty() {
            value
        } else {
            let base = entries
                .get(key)
                .and_then(|e| serde_json::from_str(&e.value).ok())
                .unwrap_or_else(|| Value::Object(Map::new()));
            set_by_path(&base, rest, value)
        };

        entries.insert(
            key.to_string(),
            ContextEntry {
                key: key.to_string(),
                value: serde_json::to_string(&merged)?,
                kind: ValueKind::Json,
            },
        );
        Ok(())
    }

    /// Render a template by substituting `{{key}}` tokens.
    ///
    /// Text entries substitute their raw value; JSON entries substitute
    /// the compact form of their parsed value. Tokens naming no entry are
    /// left literal, and an entry whose JSON fails to parse is logged and
    /// skipped while every other token still resolves.
    pub async fn interpolate(&self, workspace: &str, template: &str) -> String {
        if !template.contains("{{") {
            return template.to_string();
        }

        let workspaces = self.workspaces.read().await;
        let Some(entries) = workspaces.get(workspace) else {
            return template.to_string();
        };

        let mut rendered = template.to_string();
        for entry in entries.values() {
            let token = format!("{{{{{}}}}}", entry.key);
            if !rendered.contains(&token) {
                continue;
            }
            let replacement = match entry.kind {
                ValueKind::Text => entry.value.clone(),
                ValueKind::Json => match serde_json::from_str::<Value>(&entry.value) {
                    Ok(value) => value.to_string(),
                    Err(e) => {
                        warn!(workspace = %workspace, key = %entry.key, error = %e, "Skipping unparseable JSON entry during interpolation");
                        continue;
                    }
                },
            };
            rendered = rendered.replace(&token, &replacement);
        }
        rendered
    }

    /// Drop every entry owned by a workspace
    pub async fn reset(&self, workspace: &str) {
        let mut workspaces = self.workspaces.write().await;
        workspaces.remove(workspace);
    }

    /// Snapshot a workspace's entries, sorted by key
    pub async fn entries(&self, workspace: &str) -> Vec<ContextEntry> {
        let workspaces = self.workspaces.read().await;
        let mut entries: Vec<ContextEntry> = workspaces
            .get(workspace)
            .map(|e| e.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Snapshot a workspace as one JSON object: JSON entries are parsed
    /// (falling back to their raw text), text entries become strings.
    pub async fn snapshot(&self, workspace: &str) -> Value {
        let workspaces = self.workspaces.read().await;
        let mut map = Map::new();
        if let Some(entries) = workspaces.get(workspace) {
            for entry in entries.values() {
                let value = match entry.kind {
                    ValueKind::Text => Value::String(entry.value.clone()),
                    ValueKind::Json => serde_json::from_str(&entry.value)
                        .unwrap_or_else(|_| Value::String(entry.value.clone())),
                };
                map.insert(entry.key.clone(), value);
            }
        }
        Value::Object(map)
    }
}
