use crate::paths::WorklogPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy constants read from `config.json` in the data root.
/// Missing file or unknown keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How many trailing events the OFF_TRACK heuristic inspects for
    /// uncommitted activity. Tunable policy, not a contract.
    pub recent_window: usize,
    /// Override for the classifier endpoint (OpenAI-compatible).
    pub classify_url: Option<String>,
    pub classify_model: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_window: 10,
            classify_url: None,
            classify_model: None,
        }
    }
}

impl Config {
    pub fn load(paths: &WorklogPaths) -> Self {
        Self::load_from(&paths.config_json)
    }

    fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(%err, "unreadable config.json, using defaults");
                Self::default()
            }
        }
    }
}

/// Read the raw config map for `worklog config get|set|list`.
/// Returns an empty map if the file does not exist.
pub fn read_map(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

pub fn write_map(
    path: &Path,
    map: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(map)?)?;
    Ok(())
}

/// Parse a CLI-supplied string into a JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}
