//! Client-only decision filtering
//!
//! Heartbeats are decisions carrying no actionable tool call. Hiding them is
//! a pure view transform over the already-synchronized window, never a
//! server query parameter.

use crate::model::Decision;

/// Decisions visible under the "show heartbeats" toggle.
///
/// Pure and idempotent over the same input; ordering is preserved.
pub fn visible_decisions(decisions: &[Decision], show_heartbeats: bool) -> Vec<&Decision> {
    decisions
        .iter()
        .filter(|d| show_heartbeats || d.action.is_actionable())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions() -> Vec<Decision> {
        serde_json::from_value(serde_json::json!([
            {"timestamp": "2024-03-01T08:00:03", "agent_id": "heating", "action": "heat_on"},
            {"timestamp": "2024-03-01T08:00:02", "agent_id": "heating", "action": "No Action"},
            {"timestamp": "2024-03-01T08:00:01", "agent_id": "lighting",
             "decision": {"actions": [{"tool": "light_on", "parameters": {}}]}},
            {"timestamp": "2024-03-01T08:00:00", "agent_id": "cooling",
             "decision": {"actions": []}},
        ]))
        .unwrap()
    }

    #[test]
    fn test_heartbeats_hidden_by_default_toggle() {
        let all = decisions();
        let shown = visible_decisions(&all, false);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].agent_id, "heating");
        assert_eq!(shown[1].agent_id, "lighting");
    }

    #[test]
    fn test_show_heartbeats_passes_everything() {
        let all = decisions();
        assert_eq!(visible_decisions(&all, true).len(), 4);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let all = decisions();
        let once: Vec<Decision> = visible_decisions(&all, false)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<Decision> = visible_decisions(&once, false)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(once, twice);
    }
}
