//! Live-state synchronizer
//!
//! Maintains a soft-realtime mirror of the server-owned collections using a
//! hybrid pull/push model:
//!
//! - **Pull**: four independent snapshot fetches (agents, decisions, daily
//!   stats, per-agent performance) on startup, on reconnect, and on demand.
//!   Each is independently fallible; a failure leaves that collection's
//!   prior state untouched.
//! - **Push**: one WebSocket connection delivering `{type, data}` frames,
//!   processed strictly in arrival order through a pure reducer.
//!
//! The reducer ([`DashboardState::apply`]) is a pure function of
//! `(state, event)`, so every merge rule is unit-testable without a server
//! or a render loop. Side effects the reducer cannot perform itself (agent
//! re-pulls cued by `status` and `decision` frames) are returned as
//! [`Followup`] values for the engine to execute.

mod engine;
mod filter;
mod state;
mod stream;

pub use engine::{SyncCommand, SyncHandle, SyncOptions, Synchronizer, ws_endpoint};
pub use filter::visible_decisions;
pub use state::{
    DEFAULT_DECISION_WINDOW, DashboardState, Followup, InitialSnapshots, RetrievalMark, SyncEvent,
};
pub use stream::{StreamEvent, parse_frame};
