//! Decision records and action-payload normalization
//!
//! The backend has shipped two decision schemas: an early one with a flat
//! `action` string, and a later one nesting `decision.actions[]` as
//! structured tool calls. REST responses use the nested form, push frames
//! the flat one. Both are normalized into [`ActionPayload`] on deserialize
//! so presentation code never branches on field presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One structured tool invocation from a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub tool: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Normalized action payload of a decision record
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionPayload {
    /// Flat string from the legacy schema, e.g. `"set_temperature(21.5)"`
    Legacy(String),
    /// Structured tool calls from the current schema
    Structured(Vec<ActionCall>),
    /// Record carried no action at all
    #[default]
    None,
}

impl ActionPayload {
    /// Whether this decision did anything beyond a heartbeat.
    ///
    /// Legacy records encode "nothing happened" as sentinel strings; the
    /// structured schema as an empty list.
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Structured(calls) => !calls.is_empty(),
            Self::Legacy(raw) => !matches!(raw.trim(), "" | "No Action" | "None" | "[]"),
            Self::None => false,
        }
    }

    /// Short human-readable rendering for tables and log lines
    pub fn summary(&self) -> String {
        match self {
            Self::Legacy(raw) => raw.clone(),
            Self::Structured(calls) if calls.is_empty() => "-".to_string(),
            Self::Structured(calls) => calls
                .iter()
                .map(|c| c.tool.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::None => "-".to_string(),
        }
    }
}

/// One logged reasoning/action/result record attributed to an agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    pub reasoning: Option<String>,
    pub action: ActionPayload,
    pub result: Option<Value>,
    pub dry_run: bool,
}

/// Superset of every field either schema revision may carry
#[derive(Deserialize)]
struct RawDecision {
    #[serde(deserialize_with = "super::de_timestamp")]
    timestamp: DateTime<Utc>,
    agent_id: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    actions: Option<Vec<ActionCall>>,
    #[serde(default)]
    decision: Option<RawInnerDecision>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    execution_results: Option<Value>,
    #[serde(default)]
    dry_run: bool,
}

#[derive(Deserialize)]
struct RawInnerDecision {
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    actions: Option<Vec<ActionCall>>,
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawDecision::deserialize(deserializer)?;

        let inner = raw.decision;
        let structured = raw
            .actions
            .or_else(|| inner.as_ref().and_then(|d| d.actions.clone()));

        let action = match (structured, raw.action) {
            (Some(calls), _) => ActionPayload::Structured(calls),
            (None, Some(text)) => ActionPayload::Legacy(text),
            (None, None) => ActionPayload::None,
        };

        Ok(Decision {
            timestamp: raw.timestamp,
            agent_id: raw.agent_id,
            reasoning: raw.reasoning.or(inner.and_then(|d| d.reasoning)),
            action,
            result: raw.result.or(raw.execution_results),
            dry_run: raw.dry_run,
        })
    }
}

impl Decision {
    /// Lenient per-record parse used when ingesting arrays of decision logs.
    ///
    /// A single corrupt log file on the backend must not drop the whole
    /// response, so failures are logged and skipped by the caller.
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(decision) => Some(decision),
            Err(err) => {
                warn!(error = %err, "Discarding malformed decision record");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_schema_normalizes() {
        let decision: Decision = serde_json::from_str(
            r#"{
                "timestamp": "2024-03-01T08:00:00",
                "agent_id": "heating",
                "reasoning": "Temperature below target",
                "action": "set_temperature(21.5)",
                "dry_run": true
            }"#,
        )
        .unwrap();

        assert_eq!(
            decision.action,
            ActionPayload::Legacy("set_temperature(21.5)".to_string())
        );
        assert!(decision.action.is_actionable());
        assert!(decision.dry_run);
    }

    #[test]
    fn test_structured_schema_normalizes() {
        let decision: Decision = serde_json::from_str(
            r#"{
                "timestamp": "2024-03-01T08:00:00+00:00",
                "agent_id": "lighting",
                "decision": {
                    "reasoning": "Sunset detected",
                    "actions": [
                        {"tool": "light_on", "parameters": {"entity_id": "light.porch"}}
                    ]
                },
                "execution_results": [{"tool": "light_on", "result": "ok"}]
            }"#,
        )
        .unwrap();

        match &decision.action {
            ActionPayload::Structured(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].tool, "light_on");
            }
            other => panic!("expected structured payload, got {:?}", other),
        }
        assert_eq!(decision.reasoning.as_deref(), Some("Sunset detected"));
        assert!(decision.result.is_some());
    }

    #[test]
    fn test_heartbeat_sentinels() {
        assert!(!ActionPayload::Legacy("No Action".to_string()).is_actionable());
        assert!(!ActionPayload::Legacy("None".to_string()).is_actionable());
        assert!(!ActionPayload::Legacy("[]".to_string()).is_actionable());
        assert!(!ActionPayload::Structured(vec![]).is_actionable());
        assert!(!ActionPayload::None.is_actionable());
        assert!(ActionPayload::Legacy("lock_door".to_string()).is_actionable());
    }

    #[test]
    fn test_no_action_fields_at_all() {
        let decision: Decision = serde_json::from_str(
            r#"{"timestamp": "2024-03-01T08:00:00", "agent_id": "cooling"}"#,
        )
        .unwrap();
        assert_eq!(decision.action, ActionPayload::None);
        assert!(!decision.action.is_actionable());
    }

    #[test]
    fn test_from_value_discards_garbage() {
        assert!(Decision::from_value(serde_json::json!({"agent_id": 7})).is_none());
        assert!(
            Decision::from_value(serde_json::json!({
                "timestamp": "2024-03-01T08:00:00",
                "agent_id": "heating"
            }))
            .is_some()
        );
    }

    #[test]
    fn test_summary_rendering() {
        let payload = ActionPayload::Structured(vec![
            ActionCall {
                tool: "light_on".to_string(),
                parameters: Value::Null,
            },
            ActionCall {
                tool: "notify".to_string(),
                parameters: Value::Null,
            },
        ]);
        assert_eq!(payload.summary(), "light_on, notify");
        assert_eq!(ActionPayload::None.summary(), "-");
    }
}
