//! Core rule engine - pure, deterministic, and testable
//!
//! This crate contains the match-3 rules: the grid, match detection and the
//! cascade state machine. It has **no dependencies** on UI, networking, or
//! I/O; presentation and game-state logic are reached only through the
//! collaborator traits in [`collab`].
//!
//! - **Deterministic**: every random choice flows through one seeded [`SimpleRng`]
//! - **Phase-driven**: [`Cascade::advance`] performs one phase boundary per call
//!
//! # Module Structure
//!
//! - [`grid`]: flat row-major cell storage, gravity, fills, original formation
//! - [`matcher`]: run detection, match direction, potential-move lookahead
//! - [`cascade`]: swap → resolve → collapse → refill → rescan pipeline
//! - [`collab`]: `ViewPool` and `GameObserver` contracts
//! - [`config`]: board configuration and validation
//! - [`snapshot`]: read model for renderers and remote observers
//!
//! # Example
//!
//! ```
//! use tui_match3_core::{BoardConfig, Cascade, HeadlessViews};
//! use tui_match3_core::types::Phase;
//!
//! let mut views = HeadlessViews::new();
//! let mut cascade = Cascade::new(BoardConfig::default().with_seed(7), &mut views).unwrap();
//! cascade.run_until_idle(&mut views);
//! assert_eq!(cascade.phase(), Phase::Idle);
//!
//! // Any reported hint is a real move.
//! let hint = cascade.hint().to_vec();
//! assert!(!hint.is_empty());
//! ```

pub mod cascade;
pub mod collab;
pub mod config;
pub mod error;
pub mod grid;
pub mod matcher;
pub mod rng;
pub mod snapshot;

pub use tui_match3_types as types;

// Re-export commonly used types for convenience
pub use cascade::{Cascade, CascadeStats};
pub use collab::{dispatch, GameObserver, HeadlessViews, ViewPool};
pub use config::BoardConfig;
pub use error::{CoreError, CoreResult};
pub use grid::{Grid, Slot};
pub use matcher::{MatchFinder, PotentialMove};
pub use rng::SimpleRng;
pub use snapshot::BoardSnapshot;
