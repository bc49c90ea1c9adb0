//! Read model of the board for renderers and remote observers.

use crate::types::{Coord, ItemKind, Phase, EMPTY_CODE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    /// Row-major item codes, bottom row first (`EMPTY_CODE` for gaps)
    pub cells: Vec<u8>,
    /// FNV-1a over `cells`
    pub board_hash: u64,
    pub phase: Phase,
    pub busy: bool,
    pub hint: Vec<Coord>,
    pub chain: u32,
    pub shuffles: u32,
    pub moves_resolved: u32,
    pub swaps_rejected: u32,
    pub items_cleared: u32,
    /// Bumped at every phase boundary
    pub revision: u64,
    pub seed: u32,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            board_hash: fnv1a64(std::iter::empty()),
            phase: Phase::Idle,
            busy: false,
            hint: Vec::new(),
            chain: 0,
            shuffles: 0,
            moves_resolved: 0,
            swaps_rejected: 0,
            items_cleared: 0,
            revision: 0,
            seed: 0,
        }
    }
}

impl BoardSnapshot {
    pub fn code_at(&self, c: Coord) -> u8 {
        if c.x >= self.width || c.y >= self.height {
            return EMPTY_CODE;
        }
        self.cells
            .get(c.y as usize * self.width as usize + c.x as usize)
            .copied()
            .unwrap_or(EMPTY_CODE)
    }

    pub fn kind_at(&self, c: Coord) -> Option<ItemKind> {
        ItemKind::from_code(self.code_at(c))
    }

    /// Rows from the top of the board down, as drawn on screen.
    pub fn rows_top_down(&self) -> impl Iterator<Item = &[u8]> {
        let w = self.width.max(1) as usize;
        self.cells.chunks(w).rev()
    }

    pub fn playable(&self) -> bool {
        !self.busy && self.phase != Phase::Halted
    }

    pub fn rehash(&mut self) {
        self.board_hash = fnv1a64(self.cells.iter().copied());
    }
}

/// FNV-1a 64-bit.
pub fn fnv1a64(bytes: impl Iterator<Item = u8>) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x00000100000001B3);
    }
    h
}
