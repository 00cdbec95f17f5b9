//! Agent factory types: server-proposed templates and draft configurations

use serde::{Deserialize, Serialize};

/// A ready-to-use agent template proposed by the backend.
///
/// Suggestions have no identity beyond their position in the returned array
/// and are never mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub prompt: String,
}

/// A draft agent configuration generated from a free-text prompt,
/// pending user approval before it is persisted server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub decision_interval: u64,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub instruction: String,
}
