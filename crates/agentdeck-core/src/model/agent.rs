//! Agent status types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status reported by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Deciding,
    Error,
    /// Any status string this client version doesn't know about
    #[serde(other)]
    #[default]
    Unknown,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Deciding => "deciding",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One server-managed autonomous decision unit, as reported by `/api/agents`.
///
/// Agents are created and destroyed server-side only; the client mirrors
/// them and never synthesizes new entries from push events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default, deserialize_with = "super::de_opt_timestamp")]
    pub last_decision: Option<DateTime<Utc>>,
    #[serde(default)]
    pub decision_interval: u64,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub entities: Vec<String>,
}

/// Partial agent update pushed over the event stream (`agent_update` frames).
///
/// Only the fields the backend actually broadcast are present; everything
/// else stays untouched on merge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentPatch {
    pub agent_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
    #[serde(
        default,
        alias = "last_active",
        deserialize_with = "super::de_opt_timestamp"
    )]
    pub last_decision: Option<DateTime<Utc>>,
}

impl Agent {
    /// Shallow-merge a pushed patch into this agent
    pub fn merge(&mut self, patch: &AgentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ts) = patch.last_decision {
            self.last_decision = Some(ts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_unknown_fallback() {
        let status: AgentStatus = serde_json::from_str("\"meditating\"").unwrap();
        assert_eq!(status, AgentStatus::Unknown);

        let status: AgentStatus = serde_json::from_str("\"deciding\"").unwrap();
        assert_eq!(status, AgentStatus::Deciding);
    }

    #[test]
    fn test_agent_deserialize_minimal() {
        // Older backends omit interval/instruction/entities entirely
        let agent: Agent = serde_json::from_str(
            r#"{"agent_id": "heating", "name": "Heating", "status": "idle", "model": "mistral:7b-instruct", "last_decision": null}"#,
        )
        .unwrap();
        assert_eq!(agent.agent_id, "heating");
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.last_decision.is_none());
        assert!(agent.entities.is_empty());
    }

    #[test]
    fn test_patch_merge_only_present_fields() {
        let mut agent: Agent = serde_json::from_str(
            r#"{"agent_id": "security", "name": "Security", "status": "idle", "model": "m"}"#,
        )
        .unwrap();

        let patch: AgentPatch = serde_json::from_str(
            r#"{"agent_id": "security", "status": "deciding", "last_active": "2024-03-01T08:00:00"}"#,
        )
        .unwrap();

        agent.merge(&patch);
        assert_eq!(agent.status, AgentStatus::Deciding);
        assert_eq!(agent.name, "Security");
        assert!(agent.last_decision.is_some());
    }
}
