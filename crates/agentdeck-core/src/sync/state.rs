//! View-model state container and pure reducer

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::Result;
use crate::model::{Agent, AgentPerformance, DailyActivity, Decision, KnowledgeRetrieval};

use super::stream::StreamEvent;

/// Default rolling-window size for the decision list
pub const DEFAULT_DECISION_WINDOW: usize = 50;

/// How long the knowledge-retrieval indicator stays active after receipt
const RETRIEVAL_ACTIVE_SECS: i64 = 10;

/// The last knowledge retrieval, stamped with client-observed receipt time.
///
/// A single replaceable slot, not a list; it only drives a transient
/// "active" indicator in the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalMark {
    pub retrieval: KnowledgeRetrieval,
    pub received_at: DateTime<Utc>,
}

/// Everything the synchronizer can feed into the reducer
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Push channel established
    Connected,
    /// Push channel lost; pull-only staleness until reconnect
    Disconnected,
    /// Full agent snapshot from `/api/agents`
    Agents(Vec<Agent>),
    /// Recent-decisions snapshot, newest first
    Decisions(Vec<Decision>),
    /// Daily aggregate snapshot
    Daily(Vec<DailyActivity>),
    /// Per-agent performance snapshot
    Performance(BTreeMap<String, AgentPerformance>),
    /// Explicit remove-by-identity after a successful delete
    AgentRemoved(String),
    /// One inbound push frame
    Stream(StreamEvent),
}

/// Side effects the reducer asks the engine to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Re-pull the full agent snapshot
    RefetchAgents,
}

/// In-memory mirror of the server-owned collections.
///
/// Eventually consistent, never strongly consistent: at most one in-flight
/// staleness window between server truth and this view.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub agents: Vec<Agent>,
    /// Rolling window, newest first, bounded by `decision_window`
    pub decisions: Vec<Decision>,
    pub daily: Vec<DailyActivity>,
    pub performance: BTreeMap<String, AgentPerformance>,
    pub last_retrieval: Option<RetrievalMark>,
    pub connected: bool,
    decision_window: usize,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_WINDOW)
    }
}

impl DashboardState {
    pub fn new(decision_window: usize) -> Self {
        Self {
            agents: Vec::new(),
            decisions: Vec::new(),
            daily: Vec::new(),
            performance: BTreeMap::new(),
            last_retrieval: None,
            connected: false,
            decision_window: decision_window.max(1),
        }
    }

    pub fn decision_window(&self) -> usize {
        self.decision_window
    }

    /// Whether a knowledge retrieval was observed within the last 10 seconds
    pub fn retrieval_active(&self, now: DateTime<Utc>) -> bool {
        self.last_retrieval
            .as_ref()
            .is_some_and(|mark| now - mark.received_at < Duration::seconds(RETRIEVAL_ACTIVE_SECS))
    }

    /// Apply one event. Pure in `(self, event, now)`; any required side
    /// effects come back as [`Followup`] values.
    pub fn apply(&mut self, event: SyncEvent, now: DateTime<Utc>) -> Vec<Followup> {
        match event {
            SyncEvent::Connected => {
                self.connected = true;
                Vec::new()
            }
            SyncEvent::Disconnected => {
                self.connected = false;
                Vec::new()
            }
            SyncEvent::Agents(agents) => {
                self.agents = agents;
                Vec::new()
            }
            SyncEvent::Decisions(mut decisions) => {
                decisions.truncate(self.decision_window);
                self.decisions = decisions;
                Vec::new()
            }
            SyncEvent::Daily(daily) => {
                self.daily = daily;
                Vec::new()
            }
            SyncEvent::Performance(performance) => {
                self.performance = performance;
                Vec::new()
            }
            SyncEvent::AgentRemoved(agent_id) => {
                self.agents.retain(|a| a.agent_id != agent_id);
                Vec::new()
            }
            SyncEvent::Stream(StreamEvent::Status) => {
                // Cheap full resync beats merging a status payload
                vec![Followup::RefetchAgents]
            }
            SyncEvent::Stream(StreamEvent::AgentUpdate(patch)) => {
                match self.agents.iter_mut().find(|a| a.agent_id == patch.agent_id) {
                    Some(agent) => agent.merge(&patch),
                    None => {
                        // Never synthesize agents from push events; the next
                        // full pull will pick up anything new
                        debug!(agent_id = %patch.agent_id, "Dropping update for unknown agent");
                    }
                }
                Vec::new()
            }
            SyncEvent::Stream(StreamEvent::Decision(decision)) => {
                self.decisions.insert(0, decision);
                self.decisions.truncate(self.decision_window);
                // A decision usually implies an agent state change that is
                // not otherwise pushed
                vec![Followup::RefetchAgents]
            }
            SyncEvent::Stream(StreamEvent::KnowledgeRetrieval(retrieval)) => {
                self.last_retrieval = Some(RetrievalMark {
                    retrieval,
                    received_at: now,
                });
                Vec::new()
            }
        }
    }

    /// Absorb the results of the four concurrent snapshot pulls.
    ///
    /// Each pull is independently fallible; a failed or malformed response
    /// is logged and leaves that collection's prior state untouched.
    pub fn absorb(&mut self, snapshots: InitialSnapshots, now: DateTime<Utc>) {
        match snapshots.agents {
            Ok(agents) => {
                self.apply(SyncEvent::Agents(agents), now);
            }
            Err(err) => warn!(error = %err, "Agent snapshot fetch failed, keeping prior state"),
        }
        match snapshots.decisions {
            Ok(decisions) => {
                self.apply(SyncEvent::Decisions(decisions), now);
            }
            Err(err) => warn!(error = %err, "Decision snapshot fetch failed, keeping prior state"),
        }
        match snapshots.daily {
            Ok(daily) => {
                self.apply(SyncEvent::Daily(daily), now);
            }
            Err(err) => warn!(error = %err, "Daily stats fetch failed, keeping prior state"),
        }
        match snapshots.performance {
            Ok(performance) => {
                self.apply(SyncEvent::Performance(performance), now);
            }
            Err(err) => warn!(error = %err, "Performance stats fetch failed, keeping prior state"),
        }
    }
}

/// Results of the four independently-dispatched snapshot reads.
///
/// No transactional grouping: partial initial state (agents loaded,
/// analytics failed) is an accepted steady state.
#[derive(Debug)]
pub struct InitialSnapshots {
    pub agents: Result<Vec<Agent>>,
    pub decisions: Result<Vec<Decision>>,
    pub daily: Result<Vec<DailyActivity>>,
    pub performance: Result<BTreeMap<String, AgentPerformance>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentPatch, AgentStatus};
    use chrono::TimeZone;

    fn agent(id: &str, status: AgentStatus) -> Agent {
        serde_json::from_value(serde_json::json!({
            "agent_id": id,
            "name": id,
            "model": "mistral:7b-instruct",
            "status": status.as_str(),
        }))
        .unwrap()
    }

    fn decision(agent_id: &str, secs: u32) -> Decision {
        serde_json::from_value(serde_json::json!({
            "timestamp": format!("2024-03-01T08:00:{:02}", secs),
            "agent_id": agent_id,
            "action": "heat_on",
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_agent_update_merges_known_agent() {
        let mut state = DashboardState::default();
        state.apply(
            SyncEvent::Agents(vec![
                agent("heating", AgentStatus::Idle),
                agent("security", AgentStatus::Idle),
            ]),
            now(),
        );

        let patch = AgentPatch {
            agent_id: "heating".to_string(),
            name: None,
            status: Some(AgentStatus::Deciding),
            last_decision: None,
        };
        let followups = state.apply(SyncEvent::Stream(StreamEvent::AgentUpdate(patch)), now());

        assert!(followups.is_empty());
        assert_eq!(state.agents.len(), 2);
        assert_eq!(state.agents[0].status, AgentStatus::Deciding);
        assert_eq!(state.agents[1].status, AgentStatus::Idle);
    }

    #[test]
    fn test_agent_update_unknown_id_is_dropped() {
        let mut state = DashboardState::default();
        state.apply(
            SyncEvent::Agents(vec![agent("security", AgentStatus::Idle)]),
            now(),
        );

        let patch = AgentPatch {
            agent_id: "heating".to_string(),
            name: None,
            status: Some(AgentStatus::Error),
            last_decision: None,
        };
        state.apply(SyncEvent::Stream(StreamEvent::AgentUpdate(patch)), now());

        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.agents[0].agent_id, "security");
    }

    #[test]
    fn test_agent_update_preserves_identity_set() {
        let mut state = DashboardState::default();
        state.apply(
            SyncEvent::Agents(vec![
                agent("heating", AgentStatus::Idle),
                agent("cooling", AgentStatus::Idle),
            ]),
            now(),
        );

        let before: Vec<String> = state.agents.iter().map(|a| a.agent_id.clone()).collect();

        for (id, status) in [
            ("heating", AgentStatus::Deciding),
            ("cooling", AgentStatus::Error),
            ("heating", AgentStatus::Idle),
            ("phantom", AgentStatus::Deciding),
        ] {
            let patch = AgentPatch {
                agent_id: id.to_string(),
                name: None,
                status: Some(status),
                last_decision: None,
            };
            state.apply(SyncEvent::Stream(StreamEvent::AgentUpdate(patch)), now());
        }

        let after: Vec<String> = state.agents.iter().map(|a| a.agent_id.clone()).collect();
        assert_eq!(before, after);
        // Last write wins per identity
        assert_eq!(state.agents[0].status, AgentStatus::Idle);
        assert_eq!(state.agents[1].status, AgentStatus::Error);
    }

    #[test]
    fn test_decision_window_newest_first_and_bounded() {
        let mut state = DashboardState::new(3);

        for i in 0..5 {
            let followups = state.apply(
                SyncEvent::Stream(StreamEvent::Decision(decision("heating", i))),
                now(),
            );
            assert_eq!(followups, vec![Followup::RefetchAgents]);
        }

        assert_eq!(state.decisions.len(), 3);
        // Newest (i=4) at the head
        assert_eq!(state.decisions[0].timestamp.to_string(), "2024-03-01 08:00:04 UTC");
        assert_eq!(state.decisions[2].timestamp.to_string(), "2024-03-01 08:00:02 UTC");
    }

    #[test]
    fn test_three_decisions_into_empty_window() {
        let mut state = DashboardState::new(50);
        let (d1, d2, d3) = (
            decision("heating", 1),
            decision("cooling", 2),
            decision("security", 3),
        );

        state.apply(SyncEvent::Stream(StreamEvent::Decision(d1.clone())), now());
        state.apply(SyncEvent::Stream(StreamEvent::Decision(d2.clone())), now());
        state.apply(SyncEvent::Stream(StreamEvent::Decision(d3.clone())), now());

        assert_eq!(state.decisions, vec![d3, d2, d1]);
    }

    #[test]
    fn test_decisions_snapshot_truncated_to_window() {
        let mut state = DashboardState::new(2);
        state.apply(
            SyncEvent::Decisions(vec![
                decision("a", 3),
                decision("a", 2),
                decision("a", 1),
            ]),
            now(),
        );
        assert_eq!(state.decisions.len(), 2);
    }

    #[test]
    fn test_status_frame_cues_refetch() {
        let mut state = DashboardState::default();
        let followups = state.apply(SyncEvent::Stream(StreamEvent::Status), now());
        assert_eq!(followups, vec![Followup::RefetchAgents]);
    }

    #[test]
    fn test_retrieval_indicator_expires() {
        let mut state = DashboardState::default();
        let received = now();
        state.apply(
            SyncEvent::Stream(StreamEvent::KnowledgeRetrieval(KnowledgeRetrieval {
                agent_id: "heating".to_string(),
                query: "radiator manual".to_string(),
                results: Vec::new(),
            })),
            received,
        );

        assert!(state.retrieval_active(received + Duration::seconds(9)));
        assert!(!state.retrieval_active(received + Duration::seconds(11)));
    }

    #[test]
    fn test_agent_removed_by_identity() {
        let mut state = DashboardState::default();
        state.apply(
            SyncEvent::Agents(vec![
                agent("heating", AgentStatus::Idle),
                agent("cooling", AgentStatus::Idle),
            ]),
            now(),
        );

        state.apply(SyncEvent::AgentRemoved("heating".to_string()), now());
        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.agents[0].agent_id, "cooling");

        // Removing an unknown id is a no-op
        state.apply(SyncEvent::AgentRemoved("heating".to_string()), now());
        assert_eq!(state.agents.len(), 1);
    }

    #[test]
    fn test_absorb_is_independent_per_collection() {
        let mut state = DashboardState::default();
        state.absorb(
            InitialSnapshots {
                agents: Ok(vec![agent("heating", AgentStatus::Idle)]),
                decisions: Ok(vec![decision("heating", 1)]),
                daily: Err(crate::Error::Api {
                    status: 500,
                    body: "internal error".to_string(),
                }),
                performance: Ok(BTreeMap::new()),
            },
            now(),
        );

        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.decisions.len(), 1);
        assert!(state.daily.is_empty());
    }

    #[test]
    fn test_absorb_failure_keeps_prior_state() {
        let mut state = DashboardState::default();
        state.apply(
            SyncEvent::Daily(vec![
                serde_json::from_str(r#"{"date": "2024-03-01", "heating": 5}"#).unwrap(),
            ]),
            now(),
        );

        state.absorb(
            InitialSnapshots {
                agents: Ok(Vec::new()),
                decisions: Ok(Vec::new()),
                daily: Err(crate::Error::Api {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
                performance: Ok(BTreeMap::new()),
            },
            now(),
        );

        // Failed pull leaves the previously-loaded rows alone
        assert_eq!(state.daily.len(), 1);
    }

    #[test]
    fn test_connection_flag() {
        let mut state = DashboardState::default();
        assert!(!state.connected);
        state.apply(SyncEvent::Connected, now());
        assert!(state.connected);
        state.apply(SyncEvent::Disconnected, now());
        assert!(!state.connected);
    }
}
