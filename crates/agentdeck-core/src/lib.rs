//! Agentdeck Core Library
//!
//! This crate provides the core functionality for Agentdeck, including:
//! - Typed REST client for the orchestrator backend (agents, decisions,
//!   analytics, factory, config, chat, dashboard)
//! - Live-state synchronizer: pull snapshot + WebSocket push stream merged
//!   through a pure reducer into an in-memory view model
//! - Decision normalization across backend schema revisions
//! - Client configuration with file persistence

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod sync;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::ApiClient;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::sync::{DashboardState, SyncEvent, SyncHandle, Synchronizer};
}
