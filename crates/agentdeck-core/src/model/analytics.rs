//! Aggregate statistics from `/api/stats`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-day decision counts, one dynamic column per agent id.
///
/// The backend emits chart-oriented rows (`{"date": "...", "heating": 5,
/// "cooling": 2}`); the per-agent columns are flattened into a map here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

impl DailyActivity {
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// 24-hour rollup for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    #[serde(default)]
    pub decisions_24h: u64,
    #[serde(default)]
    pub error_rate: f64,
    #[serde(default)]
    pub top_tool: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_activity_dynamic_columns() {
        let row: DailyActivity = serde_json::from_str(
            r#"{"date": "2024-03-01", "heating": 5, "cooling": 2, "security": 0}"#,
        )
        .unwrap();
        assert_eq!(row.date, "2024-03-01");
        assert_eq!(row.counts.get("heating"), Some(&5));
        assert_eq!(row.total(), 7);
    }

    #[test]
    fn test_performance_defaults() {
        let perf: AgentPerformance = serde_json::from_str(r#"{"decisions_24h": 12}"#).unwrap();
        assert_eq!(perf.decisions_24h, 12);
        assert_eq!(perf.error_rate, 0.0);
        assert_eq!(perf.top_tool, "");
    }
}
