//! Error kinds surfaced by the rule engine.
//!
//! Only genuinely exceptional situations are errors. A swap that produces no
//! match, a cascade that finds nothing to clear and a board without moves are
//! ordinary pipeline outcomes reported through events instead.

use thiserror::Error;

use crate::types::{Coord, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Grid smaller than the minimum match length in either axis.
    #[error("board {width}x{height} is smaller than the minimum match length {min}")]
    InvalidDimensions { width: u8, height: u8, min: u8 },

    /// Swap between cells that are not orthogonal neighbours.
    #[error("cells {a} and {b} are not adjacent")]
    NotAdjacent { a: Coord, b: Coord },

    #[error("cell {0} is outside the board")]
    OutOfBounds(Coord),

    /// Restart requested before the first fill recorded a formation.
    #[error("no original formation has been recorded")]
    EmptyOriginalFormation,

    /// A cascade currently holds the grid.
    #[error("board is busy ({})", .0.as_str())]
    Busy(Phase),

    #[error("board is halted")]
    Halted,

    #[error("game is paused")]
    Paused,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Stable snake_case identifier, used as the wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidDimensions { .. } => "invalid_dimensions",
            CoreError::NotAdjacent { .. } => "not_adjacent",
            CoreError::OutOfBounds(_) => "out_of_bounds",
            CoreError::EmptyOriginalFormation => "empty_original_formation",
            CoreError::Busy(_) => "busy",
            CoreError::Halted => "halted",
            CoreError::Paused => "paused",
            CoreError::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_cells() {
        let err = CoreError::NotAdjacent {
            a: Coord::new(0, 0),
            b: Coord::new(2, 0),
        };
        assert_eq!(err.to_string(), "cells (0, 0) and (2, 0) are not adjacent");
        assert_eq!(err.code(), "not_adjacent");
    }

    #[test]
    fn busy_reports_phase() {
        let err = CoreError::Busy(Phase::Refilling);
        assert_eq!(err.to_string(), "board is busy (refilling)");
        assert_eq!(err.code(), "busy");
    }
}
