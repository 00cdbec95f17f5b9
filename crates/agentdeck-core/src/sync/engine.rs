//! Synchronizer task: snapshot pulls, push stream, reconnect
//!
//! One tokio task owns the [`DashboardState`]; every mutation goes through
//! the reducer, and each resulting snapshot is published on a watch channel
//! for presentation layers to read without locking. Commands (manual
//! refresh, delete notifications, shutdown) arrive over an mpsc channel so
//! the single-writer model holds even when the caller is another task.

use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::ApiClient;
use crate::config::SyncConfig;
use crate::error::{Error, Result};

use super::state::{DashboardState, Followup, InitialSnapshots, SyncEvent};
use super::stream::parse_frame;

/// Tuning knobs for the synchronizer, usually taken from [`SyncConfig`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub decision_window: usize,
    pub reconnect_floor: Duration,
    pub reconnect_ceiling: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            decision_window: super::state::DEFAULT_DECISION_WINDOW,
            reconnect_floor: Duration::from_secs(1),
            reconnect_ceiling: Duration::from_secs(30),
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            decision_window: config.decision_window,
            reconnect_floor: Duration::from_secs(config.reconnect_floor_secs),
            reconnect_ceiling: Duration::from_secs(config.reconnect_ceiling_secs),
        }
    }
}

/// Commands a presentation layer can send to the running synchronizer
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Re-pull all four snapshots now
    Refresh,
    /// An agent was deleted through the factory API; drop it from the view
    AgentRemoved(String),
    /// Tear down: close the push channel and end the task
    Shutdown,
}

/// Cloneable handle to a spawned synchronizer
#[derive(Debug, Clone)]
pub struct SyncHandle {
    state: watch::Receiver<DashboardState>,
    commands: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    /// Current snapshot of the mirrored state (cheap clone)
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Wait until the synchronizer publishes a newer snapshot
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    pub async fn refresh(&self) {
        let _ = self.commands.send(SyncCommand::Refresh).await;
    }

    pub async fn notify_agent_removed(&self, agent_id: impl Into<String>) {
        let _ = self
            .commands
            .send(SyncCommand::AgentRemoved(agent_id.into()))
            .await;
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(SyncCommand::Shutdown).await;
    }
}

/// The synchronizer task. Construct with [`Synchronizer::spawn`].
pub struct Synchronizer {
    client: ApiClient,
    options: SyncOptions,
    state: DashboardState,
    state_tx: watch::Sender<DashboardState>,
    commands: mpsc::Receiver<SyncCommand>,
}

enum LoopOutcome {
    ConnectionLost,
    ShutDown,
}

impl Synchronizer {
    /// Spawn the synchronizer on the current runtime and return its handle
    pub fn spawn(client: ApiClient, options: SyncOptions) -> SyncHandle {
        let state = DashboardState::new(options.decision_window);
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (command_tx, command_rx) = mpsc::channel(16);

        let sync = Synchronizer {
            client,
            options,
            state,
            state_tx,
            commands: command_rx,
        };
        tokio::spawn(sync.run());

        SyncHandle {
            state: state_rx,
            commands: command_tx,
        }
    }

    async fn run(mut self) {
        // Pull phase: populate what we can before the stream is up
        self.refresh_all().await;

        let endpoint = match ws_endpoint(self.client.base_url()) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                // Unreachable with a validated base URL, but don't spin
                warn!(error = %err, "Cannot derive event stream endpoint; staying pull-only");
                self.drain_commands().await;
                return;
            }
        };

        let mut backoff = self.options.reconnect_floor;
        loop {
            match connect_async(endpoint.as_str()).await {
                Ok((socket, _)) => {
                    info!(endpoint = %endpoint, "Event stream connected");
                    backoff = self.options.reconnect_floor;
                    self.apply(SyncEvent::Connected).await;
                    // Re-pull after (re)connect: anything pushed while we
                    // were down is gone for good
                    self.refresh_all().await;

                    match self.stream_loop(socket).await {
                        LoopOutcome::ShutDown => return,
                        LoopOutcome::ConnectionLost => {
                            self.apply(SyncEvent::Disconnected).await;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, delay_secs = backoff.as_secs(), "Event stream connect failed");
                    self.apply(SyncEvent::Disconnected).await;
                }
            }

            if self.wait_backoff(backoff).await {
                return;
            }
            backoff = next_backoff(backoff, self.options.reconnect_ceiling);
        }
    }

    /// Process frames and commands until the connection drops or we shut down
    async fn stream_loop(
        &mut self,
        socket: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> LoopOutcome {
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_frame(&text) {
                            self.apply(SyncEvent::Stream(event)).await;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sink.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Event stream closed by server");
                        return LoopOutcome::ConnectionLost;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(error = %err, "Event stream error");
                        return LoopOutcome::ConnectionLost;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(SyncCommand::Refresh) => self.refresh_all().await,
                    Some(SyncCommand::AgentRemoved(agent_id)) => {
                        self.apply(SyncEvent::AgentRemoved(agent_id)).await;
                    }
                    Some(SyncCommand::Shutdown) | None => {
                        let _ = sink.close().await;
                        return LoopOutcome::ShutDown;
                    }
                },
            }
        }
    }

    /// Sleep through the backoff window; returns true if shut down meanwhile
    async fn wait_backoff(&mut self, backoff: Duration) -> bool {
        let sleep = tokio::time::sleep(backoff);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                command = self.commands.recv() => match command {
                    Some(SyncCommand::Refresh) => self.refresh_all().await,
                    Some(SyncCommand::AgentRemoved(agent_id)) => {
                        self.apply(SyncEvent::AgentRemoved(agent_id)).await;
                    }
                    Some(SyncCommand::Shutdown) | None => return true,
                },
            }
        }
    }

    /// Handle remaining commands when the stream can never come up
    async fn drain_commands(&mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                SyncCommand::Refresh => self.refresh_all().await,
                SyncCommand::AgentRemoved(agent_id) => {
                    self.apply(SyncEvent::AgentRemoved(agent_id)).await;
                }
                SyncCommand::Shutdown => return,
            }
        }
    }

    /// Apply one event through the reducer, execute followups, publish
    async fn apply(&mut self, event: SyncEvent) {
        let followups = self.state.apply(event, Utc::now());
        for followup in followups {
            match followup {
                Followup::RefetchAgents => self.refetch_agents().await,
            }
        }
        self.publish();
    }

    /// Four independent, concurrently-dispatched snapshot reads.
    ///
    /// No all-or-nothing commit: each failure is absorbed individually.
    async fn refresh_all(&mut self) {
        debug!("Pulling full state snapshot");
        let (agents, decisions, daily, performance) = tokio::join!(
            self.client.agents(),
            self.client.decisions(self.options.decision_window, None),
            self.client.daily_stats(),
            self.client.performance_stats(),
        );
        self.state.absorb(
            InitialSnapshots {
                agents,
                decisions,
                daily,
                performance,
            },
            Utc::now(),
        );
        self.publish();
    }

    async fn refetch_agents(&mut self) {
        match self.client.agents().await {
            Ok(agents) => {
                self.state.apply(SyncEvent::Agents(agents), Utc::now());
            }
            Err(err) => warn!(error = %err, "Agent re-pull failed, keeping prior state"),
        }
    }

    fn publish(&self) {
        // Receivers may all be gone during teardown; that's fine
        let _ = self.state_tx.send(self.state.clone());
    }
}

/// Derive the event-stream endpoint from the backend base URL.
///
/// Scheme and host are mirrored (`http` becomes `ws`, `https` becomes
/// `wss`) and the path is suffixed with `/ws`, so the client works whether
/// the backend is served from a root path or behind a sub-path prefix.
pub fn ws_endpoint(base: &Url) -> Result<Url> {
    let raw = base.as_str().trim_end_matches('/');
    let replaced = if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        return Err(Error::InvalidInput(format!(
            "cannot derive a websocket endpoint from '{}'",
            raw
        )));
    };
    Url::parse(&format!("{}/ws", replaced))
        .map_err(|e| Error::InvalidInput(format!("derived websocket endpoint is invalid: {}", e)))
}

/// Exponential backoff: double up to the ceiling
fn next_backoff(current: Duration, ceiling: Duration) -> Duration {
    (current * 2).min(ceiling)
}
