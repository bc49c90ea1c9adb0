//! Terminal input module (engine-facing).
//!
//! Maps `crossterm` key events into [`crate::types::GameAction`]. Match-3
//! input is discrete (one key, one action), so there is no repeat handling.

pub mod map;

pub use tui_match3_types as types;

pub use map::{handle_key_event, should_quit};
