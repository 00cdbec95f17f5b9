//! Orchestrator backend REST client
//!
//! One typed method per endpoint, relative to a base URL that may carry a
//! sub-path prefix (reverse-proxy/ingress deployments). No operation is
//! retried automatically; every retry is caller-initiated.

mod client;

pub use client::{ApiClient, ApiClientBuilder};
