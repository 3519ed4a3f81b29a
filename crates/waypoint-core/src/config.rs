//! Environment configuration loader
//!
//! All waypoint binaries share configuration through plain environment
//! variables, optionally seeded from an env file. Call [`load_environment`]
//! early in `main()` before reading any config value.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Override the env file location with this variable.
pub const ENV_FILE_VAR: &str = "WAYPOINT_ENV_FILE";

/// Paths probed in order when no override is set.
pub const ENV_FILE_PATHS: &[&str] = &["/etc/waypoint/environment", ".env"];

/// Load environment variables from the first env file found.
///
/// Existing environment variables are never overridden, so the process
/// environment always wins over file contents. Returns the path that was
/// loaded, or `None` if no file was found.
pub fn load_environment() -> Option<String> {
    let candidates: Vec<String> = match std::env::var(ENV_FILE_VAR) {
        Ok(custom) => vec![custom],
        Err(_) => ENV_FILE_PATHS.iter().map(|p| p.to_string()).collect(),
    };

    for path in candidates {
        if !Path::new(&path).exists() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                let loaded = apply_env_lines(&content);
                info!("Loaded {} environment variables from {}", loaded, path);
                return Some(path);
            }
            Err(e) => {
                warn!("Failed to read environment file {}: {}", path, e);
            }
        }
    }

    debug!("No environment file found, using existing environment");
    None
}

/// Apply `KEY=VALUE` lines to the process environment, skipping keys that
/// are already set. Returns how many variables were loaded.
fn apply_env_lines(content: &str) -> usize {
    let mut loaded = 0;
    for line in content.lines() {
        let Some((key, value)) = parse_env_line(line) else {
            continue;
        };
        if std::env::var(&key).is_ok() {
            debug!("Skipped (already set): {}", key);
            continue;
        }
        std::env::set_var(&key, &value);
        debug!("Loaded: {}={}", key, redact(&key, &value));
        loaded += 1;
    }
    loaded
}

/// Parse one line into a key/value pair.
///
/// Accepts `KEY=VALUE`, `export KEY=VALUE` and quoted values. Comment and
/// blank lines yield `None`.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);

    Some((key.to_string(), value.to_string()))
}

fn redact<'a>(key: &str, value: &'a str) -> &'a str {
    const SENSITIVE: &[&str] = &["KEY", "TOKEN", "SECRET", "PASSWORD"];
    if SENSITIVE.iter().any(|s| key.to_uppercase().contains(s)) {
        "***"
    } else {
        value
    }
}

/// Get a configuration value with a default.
pub fn get_config(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional configuration value.
pub fn get_config_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get a boolean configuration value.
pub fn get_config_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(default)
}

/// Get an integer configuration value.
pub fn get_config_int(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
