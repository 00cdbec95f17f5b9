//! Backend settings, health, and chat types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Singleton snapshot of backend settings from `GET /api/config`.
///
/// Read on demand, optionally patched, never cached by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub dry_run_mode: bool,
    #[serde(default)]
    pub ollama_host: String,
    #[serde(default)]
    pub orchestrator_model: String,
    #[serde(default)]
    pub smart_model: String,
    #[serde(default)]
    pub fast_model: String,
    #[serde(default)]
    pub version: String,
    /// agent_id -> model name
    #[serde(default)]
    pub agents: BTreeMap<String, String>,
}

/// Fields accepted by `PATCH /api/config`
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run_mode: Option<bool>,
}

/// Acknowledgement returned by `PATCH /api/config`
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigUpdateAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dry_run_mode: bool,
}

/// Response from `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub actions_executed: Vec<Value>,
}

/// Response from `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub orchestrator_model: String,
    #[serde(default)]
    pub agent_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = BackendConfigPatch::default();
        assert_eq!(serde_json::to_string(&patch).unwrap(), "{}");

        let patch = BackendConfigPatch {
            dry_run_mode: Some(false),
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"dry_run_mode":false}"#
        );
    }

    #[test]
    fn test_backend_config_tolerates_extra_fields() {
        let config: BackendConfig = serde_json::from_str(
            r#"{"dry_run_mode": true, "version": "0.9.3", "new_field": 42}"#,
        )
        .unwrap();
        assert!(config.dry_run_mode);
        assert_eq!(config.version, "0.9.3");
    }
}
