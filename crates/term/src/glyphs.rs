//! Glyph pool: the terminal implementation of the core's `ViewPool`.
//!
//! Glyph records are pooled per item kind. Releasing an item parks its
//! record on that kind's free list; the next item of the same kind reuses
//! it instead of growing the table.
//!
//! Phase notifications drive short highlight flashes (exploding cells,
//! cells that just landed or were refilled).

use crate::canvas::Rgb;
use crate::core::ViewPool;
use crate::types::{BonusKind, Coord, Item, ItemKind, Phase, Tag, ViewHandle, EXPLODE_SETTLE_MS, FILL_SETTLE_MS};

/// Appearance of one item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub color: Rgb,
}

/// How the terminal draws an item kind.
pub fn glyph_for(kind: ItemKind) -> Glyph {
    match kind {
        ItemKind::Plain(tag) => Glyph {
            ch: '●',
            color: tag_color(tag),
        },
        ItemKind::Bonus(BonusKind::Row) => Glyph {
            ch: '═',
            color: Rgb::new(255, 255, 255),
        },
        ItemKind::Bonus(BonusKind::Column) => Glyph {
            ch: '║',
            color: Rgb::new(255, 255, 255),
        },
        ItemKind::Bonus(BonusKind::All) => Glyph {
            ch: '✦',
            color: Rgb::new(255, 240, 120),
        },
    }
}

pub fn tag_color(tag: Tag) -> Rgb {
    match tag {
        Tag::Red => Rgb::new(230, 70, 70),
        Tag::Orange => Rgb::new(255, 150, 40),
        Tag::Yellow => Rgb::new(240, 220, 80),
        Tag::Green => Rgb::new(100, 220, 120),
        Tag::Blue => Rgb::new(80, 130, 230),
        Tag::Purple => Rgb::new(190, 110, 220),
        Tag::Pink => Rgb::new(255, 140, 200),
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    kind: ItemKind,
    in_use: bool,
}

/// Kind of highlight currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Explode,
    Land,
}

#[derive(Debug, Default)]
pub struct GlyphPool {
    records: Vec<Record>,
    /// Free record indices per kind code
    free: [Vec<u32>; 11],
    in_use: usize,
    reused: u64,
    phase: Option<Phase>,
    flash: Option<Flash>,
    flash_cells: Vec<Coord>,
    flash_ms: u32,
}

impl GlyphPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records ever created.
    pub fn allocated(&self) -> usize {
        self.records.len()
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Acquisitions served from a free list.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn kind_of(&self, handle: ViewHandle) -> Option<ItemKind> {
        self.records
            .get(handle.0 as usize)
            .filter(|r| r.in_use)
            .map(|r| r.kind)
    }

    /// Cells to highlight this frame.
    pub fn flash(&self) -> Option<(Flash, &[Coord])> {
        self.flash.map(|f| (f, self.flash_cells.as_slice()))
    }

    /// Let flashes fade.
    pub fn tick(&mut self, elapsed_ms: u32) {
        self.flash_ms = self.flash_ms.saturating_sub(elapsed_ms);
        if self.flash_ms == 0 {
            self.flash = None;
            self.flash_cells.clear();
        }
    }

    fn start_flash(&mut self, flash: Flash, cells: &[Coord], ms: u32) {
        self.flash = Some(flash);
        self.flash_cells.clear();
        self.flash_cells.extend_from_slice(cells);
        self.flash_ms = ms;
    }
}

impl ViewPool for GlyphPool {
    fn acquire_view(&mut self, item: &Item) -> ViewHandle {
        let slot = item.kind.code() as usize;
        self.in_use += 1;
        if let Some(idx) = self.free.get_mut(slot).and_then(|list| list.pop()) {
            if let Some(record) = self.records.get_mut(idx as usize) {
                record.in_use = true;
                self.reused += 1;
                return ViewHandle(idx as u64);
            }
        }
        self.records.push(Record {
            kind: item.kind,
            in_use: true,
        });
        ViewHandle((self.records.len() - 1) as u64)
    }

    fn release_view(&mut self, handle: ViewHandle) {
        let Some(record) = self.records.get_mut(handle.0 as usize) else {
            return;
        };
        if !record.in_use {
            return;
        }
        record.in_use = false;
        self.in_use = self.in_use.saturating_sub(1);
        if let Some(list) = self.free.get_mut(record.kind.code() as usize) {
            list.push(handle.0 as u32);
        }
    }

    fn notify_phase(&mut self, phase: Phase, cells: &[Coord]) {
        self.phase = Some(phase);
        match phase {
            Phase::Collapsing => self.start_flash(Flash::Explode, cells, EXPLODE_SETTLE_MS),
            Phase::Refilling | Phase::Rescanning if !cells.is_empty() => {
                self.start_flash(Flash::Land, cells, FILL_SETTLE_MS)
            }
            Phase::Idle | Phase::Halted | Phase::Shuffling => {
                self.flash = None;
                self.flash_cells.clear();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemId;

    fn item(id: u32, kind: ItemKind) -> Item {
        Item { id: ItemId(id), kind }
    }

    #[test]
    fn released_records_are_reused_per_kind() {
        let mut pool = GlyphPool::new();
        let red = ItemKind::Plain(Tag::Red);
        let blue = ItemKind::Plain(Tag::Blue);

        let a = pool.acquire_view(&item(1, red));
        let _b = pool.acquire_view(&item(2, blue));
        pool.release_view(a);
        assert_eq!(pool.in_use(), 1);

        // A blue item does not take the red record.
        let c = pool.acquire_view(&item(3, blue));
        assert_ne!(c, a);
        assert_eq!(pool.allocated(), 3);

        let d = pool.acquire_view(&item(4, red));
        assert_eq!(d, a);
        assert_eq!(pool.reused(), 1);
        assert_eq!(pool.kind_of(d), Some(red));
    }

    #[test]
    fn double_release_is_ignored() {
        let mut pool = GlyphPool::new();
        let a = pool.acquire_view(&item(1, ItemKind::Bonus(BonusKind::Row)));
        pool.release_view(a);
        pool.release_view(a);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.kind_of(a), None);
    }

    #[test]
    fn explosion_flash_fades() {
        let mut pool = GlyphPool::new();
        pool.notify_phase(Phase::Collapsing, &[Coord::new(1, 1)]);
        let (flash, cells) = pool.flash().unwrap();
        assert_eq!(flash, Flash::Explode);
        assert_eq!(cells, &[Coord::new(1, 1)]);
        pool.tick(EXPLODE_SETTLE_MS);
        assert!(pool.flash().is_none());
    }
}
