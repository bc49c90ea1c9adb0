//! TUI Match-3 (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof, so integration tests and
//! the binary can write `tui_match3::{core,engine,adapter,term,input,types}`.

pub use tui_match3_adapter as adapter;
pub use tui_match3_core as core;
pub use tui_match3_engine as engine;
pub use tui_match3_input as input;
pub use tui_match3_term as term;
pub use tui_match3_types as types;
