//! Adapter module - remote control via TCP socket with a JSON protocol
//!
//! External agents (bots, test harnesses) drive the board through a TCP
//! socket and watch it through streamed observations and events.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP:
//!
//! 1. **Connection**: client connects (default: 127.0.0.1:7878)
//! 2. **Handshake**: client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: first client to hello becomes the controller
//! 4. **Streaming**: `observation` on every board change, `event` per cascade event
//! 5. **Commanding**: the controller sends `command` messages; each one is
//!    answered by `ack` once applied, or by `error`
//!
//! # Command Modes
//!
//! - **swap**: `{"mode":"swap","a":[x,y],"b":[x,y]}` swaps two neighbours
//! - **action**: `{"mode":"action","actions":["hint","restart"]}` runs player actions
//!
//! # Environment Variables
//!
//! - `MATCH3_AI_HOST`: bind address (default "127.0.0.1")
//! - `MATCH3_AI_PORT`: port number (default 7878)
//! - `MATCH3_AI_MAX_PENDING`: bounded command queue (default 10)
//! - `MATCH3_AI_LOG_PATH`: mirror wire traffic to a file
//! - `MATCH3_AI_DISABLED`: "1" or "true" disables the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":..,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":..,"phase":"idle","board":{...},...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"mode":"swap","a":[3,4],"b":[3,5]}
//! Server -> Client: {"type":"ack","seq":2,"ts":..,"status":"ok","phase":"resolving"}
//! Server -> Client: {"type":"event","seq":2,"ts":..,"episode_id":0,"event":"swapped","cells":[[3,4],[3,5]]}
//! ```

pub mod journal;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_match3_core as core;
pub use tui_match3_engine as engine;
pub use tui_match3_types as types;

pub use journal::{cascade_entry, FileSink, Journal, LogEvent, LogLevel};
pub use protocol::*;
pub use runtime::{apply_command, Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{adapter_disabled, run_server, run_server_with_status, AdapterStatus, ServerConfig};
