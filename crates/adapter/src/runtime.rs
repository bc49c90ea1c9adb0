//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server: commands
//! arrive on a bounded channel and are applied to the [`Session`] between
//! ticks; acks, observations and events flow back as serialized lines.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::core::{BoardSnapshot, CoreResult, ViewPool};
use crate::engine::Session;
use crate::protocol::{build_event, build_observation, create_ack, create_error, ErrorCode, ObservationMeta};
use crate::server::{adapter_disabled, run_server_with_status, AdapterStatus, ServerConfig};
use crate::types::{CascadeEvent, Coord, GameAction, Phase};

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// A client subscribed to observations and needs the current state
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Swap { a: Coord, b: Coord },
    Actions(Vec<GameAction>),
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Sent to clients streaming observations
    Observation { line: String },
    /// Sent to clients streaming events
    Event { line: String },
}

/// Apply one remote command to the session.
///
/// Actions run in order and stop at the first rejection.
pub fn apply_command<V: ViewPool>(session: &mut Session<V>, command: &ClientCommand) -> CoreResult<()> {
    match command {
        ClientCommand::Swap { a, b } => session.request_swap(*a, *b),
        ClientCommand::Actions(actions) => actions
            .iter()
            .try_for_each(|action| session.apply_action(*action)),
    }
}

/// What an observation was last published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObservationKey {
    revision: u64,
    phase: Phase,
    hint: usize,
    episode_id: u32,
    paused: bool,
    moves_left: Option<u32>,
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status: Arc<AdapterStatus>,
    /// Sequence number of server-originated messages
    seq: u64,
    published: Option<ObservationKey>,
    snapshot: BoardSnapshot,
}

impl Adapter {
    /// Start the adapter from `MATCH3_AI_*` environment variables.
    ///
    /// Returns `Ok(None)` if `MATCH3_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if adapter_disabled() {
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let status = Arc::new(AdapterStatus::default());

        let rt = Runtime::new()?;
        let server_status = Arc::clone(&status);
        rt.spawn(async move {
            if let Err(e) = run_server_with_status(config, server_status, cmd_tx, out_rx, None).await {
                eprintln!("[Adapter] server stopped: {}", e);
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            status,
            seq: 0,
            published: None,
            snapshot: BoardSnapshot::default(),
        })
    }

    pub fn status(&self) -> &AdapterStatus {
        &self.status
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Apply every queued command, replying with ack or error.
    ///
    /// Returns the number of commands applied successfully.
    pub fn process_commands<V: ViewPool>(&mut self, session: &mut Session<V>, moves_left: Option<u32>) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.try_recv() {
            let reply = match &cmd.payload {
                InboundPayload::SnapshotRequest => self.observation_line(session, moves_left),
                InboundPayload::Command(command) => match apply_command(session, command) {
                    Ok(()) => {
                        applied += 1;
                        serde_json::to_string(&create_ack(cmd.seq, Some(session.phase()))).ok()
                    }
                    Err(e) => {
                        let err = create_error(cmd.seq, ErrorCode::from_core(&e), &e.to_string());
                        serde_json::to_string(&err).ok()
                    }
                },
            };
            if let Some(line) = reply {
                self.send(OutboundMessage::ToClient {
                    client_id: cmd.client_id,
                    line,
                });
            }
        }
        applied
    }

    /// Stream cascade events to subscribed clients.
    pub fn publish_events(&mut self, episode_id: u32, events: &[CascadeEvent]) {
        for event in events {
            let seq = self.next_seq();
            if let Ok(line) = serde_json::to_string(&build_event(seq, episode_id, event)) {
                self.send(OutboundMessage::Event { line });
            }
        }
    }

    /// Broadcast an observation if anything observable changed since the last
    /// one.
    pub fn publish_observation<V: ViewPool>(&mut self, session: &Session<V>, moves_left: Option<u32>) {
        session.snapshot_into(&mut self.snapshot);
        let key = ObservationKey {
            revision: self.snapshot.revision,
            phase: self.snapshot.phase,
            hint: self.snapshot.hint.len(),
            episode_id: session.episode_id(),
            paused: session.paused(),
            moves_left,
        };
        if self.published == Some(key) {
            return;
        }
        self.published = Some(key);
        if let Some(line) = self.observation_line(session, moves_left) {
            self.send(OutboundMessage::Observation { line });
        }
    }

    fn observation_line<V: ViewPool>(&mut self, session: &Session<V>, moves_left: Option<u32>) -> Option<String> {
        session.snapshot_into(&mut self.snapshot);
        let meta = ObservationMeta {
            episode_id: session.episode_id(),
            paused: session.paused(),
            game_over: session.is_game_over(),
            moves_left,
        };
        let seq = self.next_seq();
        serde_json::to_string(&build_observation(seq, &self.snapshot, meta)).ok()
    }
}
