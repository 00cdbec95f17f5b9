//! Wire types for the orchestrator backend
//!
//! Everything the REST endpoints and the push stream exchange with the
//! client. Schema quirks across backend revisions (legacy string actions vs
//! structured action lists, naive vs zoned timestamps) are normalized here,
//! at the ingestion boundary, so nothing downstream branches on shape.

mod agent;
mod analytics;
mod decision;
mod factory;
mod knowledge;
mod settings;

pub use agent::{Agent, AgentPatch, AgentStatus};
pub use analytics::{AgentPerformance, DailyActivity};
pub use decision::{ActionCall, ActionPayload, Decision};
pub use factory::{Blueprint, Suggestion};
pub use knowledge::{KnowledgeRetrieval, RetrievalHit};
pub use settings::{BackendConfig, BackendConfigPatch, ChatReply, ConfigUpdateAck, HealthInfo};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a backend timestamp, tolerating both RFC 3339 and the naive
/// `datetime.isoformat()` strings older backend revisions emit.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Naive timestamps carry no zone; treat them as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unparseable timestamp: {}", raw)))
}

pub(crate) fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_naive() {
        let ts = parse_timestamp("2024-03-01T12:30:00.123456").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("yesterday-ish").is_none());
    }
}
