use crate::error::MapError;
use serde::Deserialize;
use std::path::Path;

/// Tunables for collision, object extraction and the override service.
/// Every field is optional in the JSON form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Base URL of the override service; no remote sync when absent
    pub override_endpoint: Option<String>,
    /// Bearer token sent to the override service
    pub auth_token: Option<String>,
    /// Inward inset applied to collision query boxes, in world pixels
    pub collision_inset: f32,
    /// Layer-name substrings that are never collidable by default
    pub non_collidable_keywords: Vec<String>,
    /// Object-name token that turns an entry into a quest
    pub quest_marker: String,
    /// Property names searched, in order, for dialogue text
    pub dialogue_properties: Vec<String>,
    /// Enable the overlay as soon as it is set up
    pub auto_enable: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            override_endpoint: None,
            auth_token: None,
            collision_inset: 2.0,
            non_collidable_keywords: ["floor", "ground", "background", "decor", "shadow", "below"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quest_marker: "quest".into(),
            dialogue_properties: ["dialogue", "dialog", "text", "message"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auto_enable: false,
        }
    }
}

impl DebugConfig {
    pub fn from_json_str(txt: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(txt)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let p = path.as_ref();
        let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
            path: p.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&txt).map_err(|source| MapError::Json {
            path: p.to_path_buf(),
            source,
        })
    }
}
