//! Protocol module - JSON message types for the remote control adapter
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sequence number)
//! and `ts` (timestamp in ms). Coordinates travel as `[x, y]` pairs with
//! `y = 0` at the bottom row.

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use crate::core::{BoardSnapshot, CoreError};
use crate::types::{CascadeEvent, Coord, GameAction, Phase};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "tui-match3";

// ============== Client -> Game Messages ==============

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_true")]
    pub stream_observations: bool,
    #[serde(default = "default_true")]
    pub stream_events: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
            stream_events: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    pub seq: u64,
    pub ts: u64,
    pub mode: CommandMode,
    /// Swap mode: first cell
    #[serde(default)]
    pub a: Option<[u8; 2]>,
    /// Swap mode: second cell
    #[serde(default)]
    pub b: Option<[u8; 2]>,
    /// Action mode
    #[serde(default)]
    pub actions: Option<ActionList>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandMode {
    Swap,
    Action,
}

/// Up to 16 actions per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionList(pub ArrayVec<GameAction, 16>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of action names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<GameAction, 16>::new();
                while let Some(name) = seq.next_element::<String>()? {
                    let action = GameAction::from_str(&name)
                        .ok_or_else(|| serde::de::Error::custom(format!("unknown action {name}")))?;
                    out.try_push(action)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Claim,
    Release,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedRole {
    Controller,
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub command_modes: Vec<CommandMode>,
}

/// Acknowledgment, sent once the command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub status: String,
    /// Pipeline phase right after a game command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    NotController,
    ControllerActive,
    InvalidCommand,
    NotAdjacent,
    OutOfBounds,
    Busy,
    Halted,
    Paused,
    Backpressure,
}

impl ErrorCode {
    /// Wire code for a rule-engine rejection.
    pub fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::NotAdjacent { .. } => ErrorCode::NotAdjacent,
            CoreError::OutOfBounds(_) => ErrorCode::OutOfBounds,
            CoreError::Busy(_) => ErrorCode::Busy,
            CoreError::Halted => ErrorCode::Halted,
            CoreError::Paused => ErrorCode::Paused,
            _ => ErrorCode::InvalidCommand,
        }
    }
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Board state observation (streamed to subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub episode_id: u32,
    pub seed: u32,
    pub playable: bool,
    pub paused: bool,
    pub game_over: bool,
    pub phase: String,
    pub busy: bool,
    pub board: BoardObservation,
    /// Cells of a potential move, empty until the hint is shown
    pub hint: Vec<[u8; 2]>,
    pub chain: u32,
    pub shuffles: u32,
    pub moves_resolved: u32,
    pub swaps_rejected: u32,
    pub items_cleared: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves_left: Option<u32>,
    pub revision: u64,
    /// 16 lowercase hex digits
    pub state_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardObservation {
    pub width: u8,
    pub height: u8,
    /// `cells[y][x]`, row 0 at the bottom; 0 = empty, 1-7 colours, 8 row bonus,
    /// 9 column bonus, 10 colour bomb
    pub cells: Vec<Vec<u8>>,
}

/// One cascade event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub seq: u64,
    pub ts: u64,
    pub episode_id: u32,
    pub event: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<[u8; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<[u8; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

// ============== Message Parsing ==============

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Parse a JSON message from a string.
///
/// A well-formed message of an unknown type is not an error; it comes back as
/// [`ParsedMessage::Unknown`] so the server can reply with a typed error.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    struct Header {
        #[serde(rename = "type")]
        msg_type: Option<String>,
        seq: Option<u64>,
    }

    let header: Header = serde_json::from_str(json)?;
    match header.msg_type.as_deref() {
        Some("hello") => serde_json::from_str(json).map(ParsedMessage::Hello),
        Some("command") => serde_json::from_str(json).map(ParsedMessage::Command),
        Some("control") => serde_json::from_str(json).map(ParsedMessage::Control),
        _ => Ok(ParsedMessage::Unknown(UnknownMessage {
            seq: header.seq.unwrap_or(0),
        })),
    }
}

/// Best-effort `seq` extraction from a line that failed to parse.
pub fn extract_seq(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let rest = &s[start + 5..];
    let rest = rest[rest.find(':')? + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    rest[..end].parse().ok()
}

pub fn coord_of(pair: [u8; 2]) -> Coord {
    Coord::new(pair[0], pair[1])
}

pub fn pair_of(c: Coord) -> [u8; 2] {
    [c.x, c.y]
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: "hello".to_string(),
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: "welcome".to_string(),
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        command_modes: vec![CommandMode::Swap, CommandMode::Action],
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, phase: Option<Phase>) -> AckMessage {
    AckMessage {
        msg_type: "ack".to_string(),
        seq,
        ts: current_timestamp_ms(),
        status: "ok".to_string(),
        phase: phase.map(|p| p.as_str().to_string()),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: "error".to_string(),
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Session-level facts the board snapshot does not carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservationMeta {
    pub episode_id: u32,
    pub paused: bool,
    pub game_over: bool,
    pub moves_left: Option<u32>,
}

pub fn build_observation(seq: u64, snap: &BoardSnapshot, meta: ObservationMeta) -> ObservationMessage {
    let w = snap.width as usize;
    let cells = if w == 0 {
        Vec::new()
    } else {
        snap.cells.chunks(w).map(<[u8]>::to_vec).collect()
    };
    ObservationMessage {
        msg_type: "observation".to_string(),
        seq,
        ts: current_timestamp_ms(),
        episode_id: meta.episode_id,
        seed: snap.seed,
        playable: snap.playable() && !meta.paused && !meta.game_over,
        paused: meta.paused,
        game_over: meta.game_over,
        phase: snap.phase.as_str().to_string(),
        busy: snap.busy,
        board: BoardObservation {
            width: snap.width,
            height: snap.height,
            cells,
        },
        hint: snap.hint.iter().copied().map(pair_of).collect(),
        chain: snap.chain,
        shuffles: snap.shuffles,
        moves_resolved: snap.moves_resolved,
        swaps_rejected: snap.swaps_rejected,
        items_cleared: snap.items_cleared,
        moves_left: meta.moves_left,
        revision: snap.revision,
        state_hash: format!("{:016x}", snap.board_hash),
    }
}

pub fn build_event(seq: u64, episode_id: u32, event: &CascadeEvent) -> EventMessage {
    let mut msg = EventMessage {
        msg_type: "event".to_string(),
        seq,
        ts: current_timestamp_ms(),
        episode_id,
        event: event.name().to_string(),
        ..EventMessage::default()
    };
    match event {
        CascadeEvent::Swapped { a, b } | CascadeEvent::SwapRejected { a, b } => {
            msg.cells = vec![pair_of(*a), pair_of(*b)];
        }
        CascadeEvent::Matched {
            cells,
            direction,
            chain,
        } => {
            msg.cells = cells.iter().copied().map(pair_of).collect();
            msg.direction = Some(direction.as_str().to_string());
            msg.chain = Some(*chain);
        }
        CascadeEvent::BonusTriggered { at, kind, cells } => {
            msg.at = Some(pair_of(*at));
            msg.bonus = Some(kind.as_str().to_string());
            msg.cells = cells.iter().copied().map(pair_of).collect();
        }
        CascadeEvent::Promoted { at, kind } => {
            msg.at = Some(pair_of(*at));
            msg.bonus = Some(kind.as_str().to_string());
        }
        CascadeEvent::Shifted { moved } => msg.count = Some(*moved),
        CascadeEvent::Refilled { cells } | CascadeEvent::Stable { hint: cells } => {
            msg.cells = cells.iter().copied().map(pair_of).collect();
        }
        CascadeEvent::Shuffled { attempt } => msg.count = Some(*attempt),
        CascadeEvent::Regenerated
        | CascadeEvent::MoveResolved
        | CascadeEvent::NoMoves
        | CascadeEvent::Restarted
        | CascadeEvent::Halted => {}
    }
    msg
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
