//! Board configuration.
//!
//! Defaults can be overridden through environment variables
//! (`MATCH3_BOARD_WIDTH`, `MATCH3_BOARD_HEIGHT`, `MATCH3_MIN_MATCH`,
//! `MATCH3_HINT_DELAY`, `MATCH3_TAGS`, `MATCH3_SEED`, `MATCH3_MAX_SHUFFLES`).
//! Unparsable values fall back to the default.

use crate::error::{CoreError, CoreResult};
use crate::types::{
    Tag, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH, DEFAULT_HINT_DELAY_SECS,
    DEFAULT_MAX_SHUFFLES, DEFAULT_MIN_MATCH, MAX_BOARD_DIM, PALETTE,
};

/// Smallest palette that keeps fills solvable.
pub const MIN_TAG_COUNT: u8 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub board_width: u8,
    pub board_height: u8,
    pub min_match_length: u8,
    /// Idle time before the hint is surfaced. Consumed by drivers, not the pipeline.
    pub hint_delay_seconds: f32,
    /// Number of plain colours in play.
    pub tag_count: u8,
    pub seed: u32,
    /// Consecutive fruitless shuffles before the board is regenerated.
    pub max_shuffles: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            min_match_length: DEFAULT_MIN_MATCH,
            hint_delay_seconds: DEFAULT_HINT_DELAY_SECS,
            tag_count: Tag::ALL.len() as u8,
            seed: 1,
            max_shuffles: DEFAULT_MAX_SHUFFLES,
        }
    }
}

impl BoardConfig {
    pub fn new(board_width: u8, board_height: u8) -> Self {
        Self {
            board_width,
            board_height,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_min_match(mut self, min_match_length: u8) -> Self {
        self.min_match_length = min_match_length;
        self
    }

    pub fn with_tag_count(mut self, tag_count: u8) -> Self {
        self.tag_count = tag_count;
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let d = Self::default();
        Self {
            board_width: parsed("MATCH3_BOARD_WIDTH").unwrap_or(d.board_width),
            board_height: parsed("MATCH3_BOARD_HEIGHT").unwrap_or(d.board_height),
            min_match_length: parsed("MATCH3_MIN_MATCH").unwrap_or(d.min_match_length),
            hint_delay_seconds: parsed("MATCH3_HINT_DELAY").unwrap_or(d.hint_delay_seconds),
            tag_count: parsed("MATCH3_TAGS").unwrap_or(d.tag_count),
            seed: parsed("MATCH3_SEED").unwrap_or(d.seed),
            max_shuffles: parsed("MATCH3_MAX_SHUFFLES").unwrap_or(d.max_shuffles),
        }
    }

    /// Reject configurations the pipeline cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_match_length < DEFAULT_MIN_MATCH {
            return Err(CoreError::InvalidConfig(format!(
                "min_match_length must be at least {}, got {}",
                DEFAULT_MIN_MATCH, self.min_match_length
            )));
        }
        if self.board_width < self.min_match_length || self.board_height < self.min_match_length {
            return Err(CoreError::InvalidDimensions {
                width: self.board_width,
                height: self.board_height,
                min: self.min_match_length,
            });
        }
        if self.board_width > MAX_BOARD_DIM || self.board_height > MAX_BOARD_DIM {
            return Err(CoreError::InvalidConfig(format!(
                "board sides are limited to {}",
                MAX_BOARD_DIM
            )));
        }
        if self.tag_count < MIN_TAG_COUNT || self.tag_count as usize > Tag::ALL.len() {
            return Err(CoreError::InvalidConfig(format!(
                "tag_count must be in {}..={}, got {}",
                MIN_TAG_COUNT,
                Tag::ALL.len(),
                self.tag_count
            )));
        }
        if !self.hint_delay_seconds.is_finite() || self.hint_delay_seconds < 0.0 {
            return Err(CoreError::InvalidConfig(
                "hint_delay_seconds must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hint_delay_ms(&self) -> u32 {
        (self.hint_delay_seconds.max(0.0) * 1000.0) as u32
    }

    /// Tags in play, in palette order.
    pub fn palette(&self) -> &'static [Tag] {
        let n = (self.tag_count as usize).clamp(1, Tag::ALL.len());
        &PALETTE[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BoardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hint_delay_ms(), 5000);
        assert_eq!(config.palette().len(), 7);
    }

    #[test]
    fn board_smaller_than_min_match_is_invalid_dimensions() {
        let config = BoardConfig::new(2, 8);
        assert_eq!(
            config.validate(),
            Err(CoreError::InvalidDimensions {
                width: 2,
                height: 8,
                min: 3
            })
        );
    }

    #[test]
    fn tag_count_bounds() {
        assert!(BoardConfig::default().with_tag_count(2).validate().is_err());
        assert!(BoardConfig::default().with_tag_count(3).validate().is_ok());
        assert!(BoardConfig::default().with_tag_count(8).validate().is_err());
        assert_eq!(BoardConfig::default().with_tag_count(4).palette().len(), 4);
    }

    #[test]
    fn min_match_bounds() {
        assert_eq!(
            BoardConfig::default().with_min_match(2).validate().unwrap_err().code(),
            "invalid_config"
        );
        assert!(BoardConfig::default().with_min_match(4).validate().is_ok());
        assert_eq!(
            BoardConfig::default().with_min_match(9).validate(),
            Err(CoreError::InvalidDimensions {
                width: 8,
                height: 8,
                min: 9
            })
        );
    }

    #[test]
    fn test_from_env_does_not_panic() {
        let _config = BoardConfig::from_env();
    }
}
