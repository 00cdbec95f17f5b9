//! Inbound event-stream frames
//!
//! The backend pushes JSON frames of the form `{"type": ..., "data": ...}`.
//! Unknown types and malformed frames are dropped without closing the
//! connection; the stream carries no frames from client to server.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{AgentPatch, Decision, KnowledgeRetrieval};

/// One recognized push event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Backend status changed; cue for a full agent re-pull. The payload
    /// carries connection bookkeeping the client has no other use for.
    Status,
    /// Incremental patch for one already-known agent
    AgentUpdate(AgentPatch),
    /// New decision record for the rolling window
    Decision(Decision),
    /// An agent queried its knowledge store
    KnowledgeRetrieval(KnowledgeRetrieval),
}

#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Parse one inbound text frame.
///
/// Returns `None` for unknown frame types and for frames whose payload
/// doesn't decode; either way the caller keeps the connection open.
pub fn parse_frame(text: &str) -> Option<StreamEvent> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "Discarding unparseable stream frame");
            return None;
        }
    };

    match frame.kind.as_str() {
        "status" => Some(StreamEvent::Status),
        "agent_update" => serde_json::from_value(frame.data)
            .map(StreamEvent::AgentUpdate)
            .map_err(|err| warn!(error = %err, "Discarding malformed agent_update frame"))
            .ok(),
        "decision" => serde_json::from_value(frame.data)
            .map(StreamEvent::Decision)
            .map_err(|err| warn!(error = %err, "Discarding malformed decision frame"))
            .ok(),
        "knowledge_retrieval" => serde_json::from_value(frame.data)
            .map(StreamEvent::KnowledgeRetrieval)
            .map_err(|err| warn!(error = %err, "Discarding malformed knowledge_retrieval frame"))
            .ok(),
        other => {
            debug!(kind = %other, "Ignoring unrecognized stream frame type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AgentStatus;

    #[test]
    fn test_parse_status_frame() {
        let event = parse_frame(
            r#"{"type": "status", "data": {"connected": true, "agents": ["heating"]}}"#,
        );
        assert_eq!(event, Some(StreamEvent::Status));
    }

    #[test]
    fn test_parse_agent_update_frame() {
        let event = parse_frame(
            r#"{"type": "agent_update", "data": {"agent_id": "heating", "status": "deciding", "last_active": "2024-03-01T08:00:00"}}"#,
        )
        .unwrap();
        match event {
            StreamEvent::AgentUpdate(patch) => {
                assert_eq!(patch.agent_id, "heating");
                assert_eq!(patch.status, Some(AgentStatus::Deciding));
            }
            other => panic!("expected agent_update, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_decision_frame_legacy_shape() {
        let event = parse_frame(
            r#"{"type": "decision", "data": {"timestamp": "2024-03-01T08:00:00", "agent_id": "heating", "reasoning": "cold", "action": "heat_on", "dry_run": false}}"#,
        )
        .unwrap();
        match event {
            StreamEvent::Decision(decision) => {
                assert_eq!(decision.agent_id, "heating");
                assert!(decision.action.is_actionable());
            }
            other => panic!("expected decision, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_dropped() {
        assert_eq!(
            parse_frame(r#"{"type": "approval_required", "data": {"id": "x"}}"#),
            None
        );
    }

    #[test]
    fn test_garbage_frame_dropped() {
        assert_eq!(parse_frame("not json at all"), None);
        assert_eq!(parse_frame(r#"{"data": {}}"#), None);
    }

    #[test]
    fn test_malformed_payload_dropped() {
        // Right type, wrong payload shape
        assert_eq!(
            parse_frame(r#"{"type": "agent_update", "data": {"status": "idle"}}"#),
            None
        );
    }
}
