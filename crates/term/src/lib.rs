//! Terminal presentation for the match-3 board.
//!
//! Renders into a plain [`Canvas`] that is diffed and flushed to the
//! terminal; no widget toolkit is involved. [`GlyphPool`] is the terminal's
//! implementation of the core `ViewPool` collaborator.
//!
//! - [`canvas`]: styled cell grid
//! - [`glyphs`]: item appearance and the pooled view records
//! - [`board_view`]: pure snapshot → canvas mapping (testable)
//! - [`renderer`]: crossterm output

pub mod board_view;
pub mod canvas;
pub mod glyphs;
pub mod renderer;

pub use tui_match3_core as core;
pub use tui_match3_types as types;

pub use board_view::{AdapterStatusView, AnchorY, BoardView, Frame, HudView, Viewport};
pub use canvas::{Canvas, Cell, CellStyle, Rgb};
pub use glyphs::{glyph_for, tag_color, Flash, Glyph, GlyphPool};
pub use renderer::{changed_runs, encode_diff_into, encode_full_into, TerminalRenderer};
