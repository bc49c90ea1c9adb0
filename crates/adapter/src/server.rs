//! TCP server for the remote control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    /// Mirror every wire line to this file
    pub log_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_AI_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATCH3_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("MATCH3_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("MATCH3_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);
        let log_path = env::var("MATCH3_AI_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid adapter address {}:{}: {e}", self.host, self.port))
    }
}

/// Check if the adapter is disabled via environment
pub fn adapter_disabled() -> bool {
    std::env::var("MATCH3_AI_DISABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Connection counters shared with the game loop (for the status panel).
#[derive(Debug, Default)]
pub struct AdapterStatus {
    clients: AtomicUsize,
    /// Controller client id; 0 means none (ids start at 1)
    controller: AtomicUsize,
}

impl AdapterStatus {
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub fn controller_id(&self) -> Option<usize> {
        match self.controller.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    handshaken: bool,
    stream_observations: bool,
    stream_events: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    status: Arc<AdapterStatus>,
}

impl ServerState {
    async fn is_handshaken(&self, client_id: usize) -> bool {
        self.clients
            .read()
            .await
            .iter()
            .any(|c| c.id == client_id && c.handshaken)
    }

    /// Enforce strictly increasing `seq` per client.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn set_controller(&self, id: Option<usize>) {
        *self.controller.write().await = id;
        self.status.controller.store(id.unwrap_or(0), Ordering::Relaxed);
    }

    async fn deliver(&self, msg: OutboundMessage) {
        let clients = self.clients.read().await;
        match msg {
            OutboundMessage::ToClient { client_id, line } => {
                if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                    let _ = c.tx.send(line);
                }
            }
            OutboundMessage::Observation { line } => {
                for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                    let _ = c.tx.send(line.clone());
                }
            }
            OutboundMessage::Event { line } => {
                for c in clients.iter().filter(|c| c.handshaken && c.stream_events) {
                    let _ = c.tx.send(line.clone());
                }
            }
        }
    }
}

fn send_json<T: Serialize>(tx: &mpsc::UnboundedSender<String>, msg: &T) {
    if let Ok(line) = serde_json::to_string(msg) {
        let _ = tx.send(line);
    }
}

/// Append raw wire lines to `path` from a background task.
fn spawn_wire_log(path: PathBuf) -> mpsc::UnboundedSender<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[Adapter] cannot open wire log {}: {}", path.display(), e);
                return;
            }
        };
        while let Some(line) = rx.recv().await {
            if file.write_all(line.as_bytes()).await.is_err() || file.write_all(b"\n").await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    tx
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up (port 0
/// picks a free port).
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    run_server_with_status(config, Arc::default(), command_tx, out_rx, ready_tx).await
}

pub async fn run_server_with_status(
    config: ServerConfig,
    status: Arc<AdapterStatus>,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;
    println!("[Adapter] TCP server listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        config,
        clients: RwLock::new(Vec::new()),
        controller: RwLock::new(None),
        status,
    });

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                state.deliver(msg).await;
            }
        });
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        println!("[Adapter] Client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log_tx = wire_log_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, Arc::clone(&state), command_tx, wire_log_tx).await {
                eprintln!("[Adapter] Client {} error: {}", client_id, e);
            }
            disconnect(&state, client_id).await;
            println!("[Adapter] Client {} disconnected", client_id);
        });
    }
}

/// Forget a client. Idempotent.
async fn disconnect(state: &ServerState, client_id: usize) {
    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
        state.status.clients.store(clients.len(), Ordering::Relaxed);
    }
    if *state.controller.read().await == Some(client_id) {
        state.set_controller(None).await;
        println!("[Adapter] Controller {} released on disconnect", client_id);
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log_tx: Option<mpsc::UnboundedSender<String>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            handshaken: false,
            stream_observations: false,
            stream_events: false,
            last_seq: None,
            tx: tx.clone(),
        });
        state.status.clients.store(clients.len(), Ordering::Relaxed);
    }

    let wire_log_out = wire_log_tx.clone();
    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
            if let Some(log) = wire_log_out.as_ref() {
                let _ = log.send(line);
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(log) = wire_log_tx.as_ref() {
            let _ = log.send(trimmed.to_string());
        }

        let message = match parse_message(trimmed) {
            Ok(m) => m,
            Err(e) => {
                let seq = extract_seq(trimmed).unwrap_or(0);
                send_json(&tx, &create_error(seq, ErrorCode::InvalidCommand, &e.to_string()));
                continue;
            }
        };

        match message {
            ParsedMessage::Hello(hello) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    send_json(
                        &tx,
                        &create_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing"),
                    );
                    continue;
                }

                let major = state.config.protocol_version.split('.').next().unwrap_or("1");
                if hello.protocol_version.split('.').next() != Some(major) {
                    send_json(
                        &tx,
                        &create_error(
                            hello.seq,
                            ErrorCode::ProtocolMismatch,
                            &format!("Protocol version {} not supported", hello.protocol_version),
                        ),
                    );
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                        client.stream_events = hello.requested.stream_events;
                    }
                }

                // First client to hello becomes controller.
                let controller = {
                    let current = *state.controller.read().await;
                    match current {
                        Some(id) => Some(id),
                        None => {
                            state.set_controller(Some(client_id)).await;
                            println!("[Adapter] Client {} is now controller", client_id);
                            Some(client_id)
                        }
                    }
                };
                let role = if controller == Some(client_id) {
                    AssignedRole::Controller
                } else {
                    AssignedRole::Observer
                };
                send_json(
                    &tx,
                    &create_welcome(
                        hello.seq,
                        &state.config.protocol_version,
                        client_id as u64,
                        role,
                        controller.map(|id| id as u64),
                    ),
                );

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            ParsedMessage::Command(cmd) => {
                if !state.is_handshaken(client_id).await {
                    send_json(
                        &tx,
                        &create_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command"),
                    );
                    continue;
                }
                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    send_json(
                        &tx,
                        &create_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing"),
                    );
                    continue;
                }
                if *state.controller.read().await != Some(client_id) {
                    send_json(
                        &tx,
                        &create_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands"),
                    );
                    continue;
                }

                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err((code, message)) => {
                        send_json(&tx, &create_error(cmd.seq, code, &message));
                        continue;
                    }
                };

                // The ack is sent by the game loop once the command is applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    send_json(
                        &tx,
                        &create_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full"),
                    );
                }
            }

            ParsedMessage::Control(ctrl) => {
                if !state.is_handshaken(client_id).await {
                    send_json(
                        &tx,
                        &create_error(ctrl.seq, ErrorCode::HandshakeRequired, "Send hello before control"),
                    );
                    continue;
                }
                if !state.check_and_update_seq(client_id, ctrl.seq).await {
                    send_json(
                        &tx,
                        &create_error(ctrl.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing"),
                    );
                    continue;
                }

                let current = *state.controller.read().await;
                match (ctrl.action, current) {
                    (ControlAction::Claim, None) => {
                        state.set_controller(Some(client_id)).await;
                        println!("[Adapter] Client {} claimed control", client_id);
                        send_json(&tx, &create_ack(ctrl.seq, None));
                    }
                    (ControlAction::Claim, Some(id)) if id == client_id => {
                        send_json(&tx, &create_ack(ctrl.seq, None));
                    }
                    (ControlAction::Claim, Some(_)) => {
                        send_json(
                            &tx,
                            &create_error(ctrl.seq, ErrorCode::ControllerActive, "Another client is controller"),
                        );
                    }
                    (ControlAction::Release, Some(id)) if id == client_id => {
                        state.set_controller(None).await;
                        println!("[Adapter] Client {} released control", client_id);
                        send_json(&tx, &create_ack(ctrl.seq, None));
                    }
                    (ControlAction::Release, _) => {
                        send_json(
                            &tx,
                            &create_error(ctrl.seq, ErrorCode::NotController, "Only controller may release"),
                        );
                    }
                }
            }

            ParsedMessage::Unknown(unknown) => {
                send_json(
                    &tx,
                    &create_error(unknown.seq, ErrorCode::InvalidCommand, "unknown message type"),
                );
            }
        }
    }

    // Dropping the last sender lets the writer flush queued lines and exit.
    disconnect(&state, client_id).await;
    drop(tx);
    let _ = write_task.await;
    Ok(())
}

fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, (ErrorCode, String)> {
    match cmd.mode {
        CommandMode::Swap => match (cmd.a, cmd.b) {
            (Some(a), Some(b)) => Ok(ClientCommand::Swap {
                a: coord_of(a),
                b: coord_of(b),
            }),
            _ => Err((
                ErrorCode::InvalidCommand,
                "swap mode requires both a and b".to_string(),
            )),
        },
        CommandMode::Action => match cmd.actions.as_ref() {
            Some(list) if !list.0.is_empty() => Ok(ClientCommand::Actions(list.0.to_vec())),
            _ => Err((
                ErrorCode::InvalidCommand,
                "action mode requires a non-empty actions list".to_string(),
            )),
        },
    }
}
