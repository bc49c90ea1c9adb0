//! Session driver for the match-3 rule engine.
//!
//! - [`session`]: fixed-timestep driver pacing the cascade by settle delays,
//!   owning cursor, selection, hint timer, pause and game over
//! - [`observer`]: game-state observers (move limit)

pub mod observer;
pub mod session;

pub use observer::MoveLimit;
pub use session::Session;
