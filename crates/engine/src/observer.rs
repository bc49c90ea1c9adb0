//! Game-state observers.

use tui_match3_core::types::CascadeEvent;
use tui_match3_core::GameObserver;

/// Move counter with an optional limit.
///
/// Only swaps that produced a match and fully settled count as moves. When
/// the limit is reached the driver is expected to call `Session::game_over`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveLimit {
    limit: Option<u32>,
    used: u32,
    no_moves: u32,
    cleared: u32,
    best_chain: u32,
}

impl MoveLimit {
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> Option<u32> {
        self.limit.map(|l| l.saturating_sub(self.used))
    }

    pub fn exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// Times the board ran out of moves and had to shuffle.
    pub fn no_moves(&self) -> u32 {
        self.no_moves
    }

    /// Items removed by matches and bonus clears.
    pub fn cleared(&self) -> u32 {
        self.cleared
    }

    pub fn best_chain(&self) -> u32 {
        self.best_chain
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.limit);
    }
}

impl GameObserver for MoveLimit {
    fn on_move_resolved(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    fn on_no_moves(&mut self) {
        self.no_moves += 1;
    }

    fn on_event(&mut self, event: &CascadeEvent) {
        match event {
            CascadeEvent::Matched { cells, chain, .. } => {
                self.cleared += cells.len() as u32;
                self.best_chain = self.best_chain.max(*chain);
            }
            CascadeEvent::BonusTriggered { cells, .. } => self.cleared += cells.len() as u32,
            CascadeEvent::Restarted => self.reset(),
            _ => {}
        }
    }
}
