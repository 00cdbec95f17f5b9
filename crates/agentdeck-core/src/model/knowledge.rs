//! Knowledge-retrieval events pushed while an agent queries its RAG store

use serde::{Deserialize, Serialize};

/// One retrieval broadcast: the query an agent ran and what came back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct KnowledgeRetrieval {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub results: Vec<RetrievalHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
}
