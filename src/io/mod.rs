//! Agent I/O contract — input parsing and the artifact listing output.
//!
//! Inputs may arrive in a typed wrapper form where a field is an object
//! `{"type": ..., "value": ...}`; `read_input` collapses those to the bare
//! value. The output is a flat list of artifact descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A produced artifact: a name plus a file-system path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

impl Artifact {
    pub fn file(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            kind: "file".to_string(),
            path: path.display().to_string(),
        }
    }
}

/// Read and parse an input object, unwrapping typed-value wrappers.
pub fn read_input(path: &Path) -> Result<Map<String, Value>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let raw: Value = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))?;
    let Value::Object(raw) = raw else {
        return Err(format!("{}: input must be a JSON object", path.display()));
    };

    let mut parsed = Map::new();
    for (key, value) in raw {
        let bare = match value {
            Value::Object(ref wrapper) if wrapper.contains_key("value") => {
                wrapper["value"].clone()
            }
            other => other,
        };
        parsed.insert(key, bare);
    }
    Ok(parsed)
}

/// Write the artifact listing.
pub fn write_output(path: &Path, artifacts: &[Artifact]) -> Result<(), String> {
    let json = serde_json::to_string_pretty(artifacts)
        .map_err(|e| format!("JSON serialize error: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("cannot write {}: {}", path.display(), e))
}
