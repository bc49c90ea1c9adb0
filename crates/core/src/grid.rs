//! Grid module - cell storage and gravity
//!
//! The grid is a flat, row-major array of optional slots (`y * width + x`).
//! Neighbours are coordinate arithmetic, never stored links, so there is no
//! cyclic cell graph to keep consistent.
//!
//! Coordinates: `(x, y)` with `y = 0` the bottom row. Gravity moves items
//! towards `y = 0`.
//!
//! Every item placed in the grid holds a view handle acquired from the
//! injected [`ViewPool`]; every item leaving the grid releases it.

use arrayvec::ArrayVec;

use crate::collab::ViewPool;
use crate::error::{CoreError, CoreResult};
use crate::rng::SimpleRng;
use crate::types::{
    Coord, Direction, Item, ItemId, ItemKind, Tag, ViewHandle, DEFAULT_MIN_MATCH, PALETTE,
};

/// An occupied cell: the owned item plus its presentation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub item: Item,
    pub view: ViewHandle,
}

/// The board.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u8,
    height: u8,
    min_match: u8,
    palette: &'static [Tag],
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Option<Slot>>,
    /// Layout captured by the first fill; restored by `restart`.
    original: Option<Vec<ItemKind>>,
    next_id: u32,
}

impl Grid {
    /// Allocate an empty `width` x `height` grid.
    ///
    /// Fails with `InvalidConfig` for a minimum match length below
    /// [`DEFAULT_MIN_MATCH`], and with `InvalidDimensions` when either side is
    /// shorter than the minimum match length.
    pub fn build(width: u8, height: u8, min_match: u8) -> CoreResult<Self> {
        if min_match < DEFAULT_MIN_MATCH {
            return Err(CoreError::InvalidConfig(format!(
                "min_match must be at least {}, got {}",
                DEFAULT_MIN_MATCH, min_match
            )));
        }
        if width == 0 || height == 0 || width < min_match || height < min_match {
            return Err(CoreError::InvalidDimensions {
                width,
                height,
                min: min_match,
            });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            min_match,
            palette: &PALETTE,
            cells: vec![None; len],
            original: None,
            next_id: 0,
        })
    }

    /// Restrict fills to `palette`. An empty palette is ignored.
    pub fn with_palette(mut self, palette: &'static [Tag]) -> Self {
        if !palette.is_empty() {
            self.palette = palette;
        }
        self
    }

    /// Build a grid from a picture, top row first.
    ///
    /// Characters are [`ItemKind::as_char`] codes; `.` is an empty cell. A
    /// fully occupied picture is recorded as the original formation.
    pub fn from_rows(rows: &[&str], min_match: u8, views: &mut dyn ViewPool) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if height > u8::MAX as usize || width > u8::MAX as usize {
            return Err(CoreError::InvalidConfig("picture too large".to_string()));
        }
        let mut grid = Self::build(width as u8, height as u8, min_match)?;

        for (row_i, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(CoreError::InvalidConfig(format!(
                    "row {} has {} cells, expected {}",
                    row_i,
                    row.chars().count(),
                    width
                )));
            }
            let y = (height - 1 - row_i) as u8;
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' {
                    continue;
                }
                let kind = ItemKind::from_char(ch).ok_or_else(|| {
                    CoreError::InvalidConfig(format!("unknown cell character {:?}", ch))
                })?;
                grid.place(Coord::new(x as u8, y), kind, views)?;
            }
        }

        if grid.is_full() {
            grid.original = Some(grid.plain_layout());
        }
        Ok(grid)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn min_match(&self) -> u8 {
        self.min_match
    }

    pub fn palette(&self) -> &'static [Tag] {
        self.palette
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Calculate flat index from coordinates
    #[inline(always)]
    pub fn index(&self, c: Coord) -> Option<usize> {
        if c.x >= self.width || c.y >= self.height {
            return None;
        }
        Some(c.y as usize * self.width as usize + c.x as usize)
    }

    #[inline(always)]
    pub fn coord_of(&self, idx: usize) -> Coord {
        let w = self.width as usize;
        Coord::new((idx % w) as u8, (idx / w) as u8)
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.index(c).is_some()
    }

    /// All coordinates in row-major order, bottom row first.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| Coord::new(x, y)))
    }

    pub fn neighbor(&self, c: Coord, dir: Direction) -> Option<Coord> {
        if !self.contains(c) {
            return None;
        }
        c.step(dir).filter(|n| self.contains(*n))
    }

    /// In-bounds neighbours, probed up, right, down, left.
    pub fn neighbors(&self, c: Coord) -> ArrayVec<Coord, 4> {
        Direction::ALL
            .iter()
            .filter_map(|d| self.neighbor(c, *d))
            .collect()
    }

    pub fn are_adjacent(&self, a: Coord, b: Coord) -> bool {
        self.contains(a) && self.contains(b) && a.is_adjacent(b)
    }

    pub fn slot(&self, c: Coord) -> Option<&Slot> {
        self.index(c).and_then(|i| self.cells[i].as_ref())
    }

    pub fn item(&self, c: Coord) -> Option<Item> {
        self.slot(c).map(|s| s.item)
    }

    pub fn kind_at(&self, c: Coord) -> Option<ItemKind> {
        self.slot(c).map(|s| s.item.kind)
    }

    /// In-bounds and unoccupied.
    pub fn is_empty_slot(&self, c: Coord) -> bool {
        matches!(self.index(c).map(|i| self.cells[i].is_none()), Some(true))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    pub fn empty_cells(&self) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| self.coord_of(i))
            .collect()
    }

    /// Current cell of an item.
    pub fn locate(&self, id: ItemId) -> Option<Coord> {
        self.cells
            .iter()
            .position(|s| matches!(s, Some(slot) if slot.item.id == id))
            .map(|i| self.coord_of(i))
    }

    /// Row-major item kinds, bottom row first.
    pub fn kinds(&self) -> Vec<Option<ItemKind>> {
        self.cells.iter().map(|s| s.map(|s| s.item.kind)).collect()
    }

    pub fn original_formation(&self) -> Option<&[ItemKind]> {
        self.original.as_deref()
    }

    /// Picture of the grid, top row first (inverse of [`Grid::from_rows`]).
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        self.kind_at(Coord::new(x, y))
                            .map(ItemKind::as_char)
                            .unwrap_or('.')
                    })
                    .collect()
            })
            .collect()
    }

    /// Replace whatever occupies `c` with a fresh item of `kind`.
    pub fn place(&mut self, c: Coord, kind: ItemKind, views: &mut dyn ViewPool) -> CoreResult<Item> {
        let idx = self.index(c).ok_or(CoreError::OutOfBounds(c))?;
        Ok(self.put(idx, kind, views))
    }

    /// Remove the item at `c`, releasing its view.
    pub fn explode(&mut self, c: Coord, views: &mut dyn ViewPool) -> Option<Item> {
        let idx = self.index(c)?;
        let slot = self.cells[idx].take()?;
        views.release_view(slot.view);
        Some(slot.item)
    }

    /// Fill every empty cell with a plain item.
    ///
    /// Each tag is drawn uniformly from the palette minus the tags directly
    /// below and to the left, so the result contains no adjacent equal pair
    /// (and therefore no match). The first call records the resulting layout
    /// as the original formation.
    pub fn fill(&mut self, rng: &mut SimpleRng, views: &mut dyn ViewPool) {
        for idx in 0..self.cells.len() {
            if self.cells[idx].is_some() {
                continue;
            }
            let c = self.coord_of(idx);
            let mut excluded = ArrayVec::<Tag, 4>::new();
            for dir in [Direction::Down, Direction::Left] {
                if let Some(tag) = self.neighbor_tag(c, dir) {
                    excluded.push(tag);
                }
            }
            let tag = self.pick_tag(&excluded, rng);
            self.put(idx, ItemKind::Plain(tag), views);
        }

        if self.original.is_none() {
            self.original = Some(self.plain_layout());
        }
    }

    /// Apply gravity column by column.
    ///
    /// Scanning each column bottom-up, every occupied cell drops by the number
    /// of empty cells seen below it. Relative order within a column is kept.
    /// Returns `(from, to)` for every moved item.
    pub fn shift_down(&mut self) -> Vec<(Coord, Coord)> {
        let mut moves = Vec::new();
        for x in 0..self.width {
            let mut shifts = 0u8;
            for y in 0..self.height {
                let from = Coord::new(x, y);
                let Some(idx) = self.index(from) else {
                    continue;
                };
                if self.cells[idx].is_none() {
                    shifts += 1;
                    continue;
                }
                if shifts == 0 {
                    continue;
                }
                let to = Coord::new(x, y - shifts);
                if let Some(dst) = self.index(to) {
                    self.cells[dst] = self.cells[idx].take();
                    moves.push((from, to));
                }
            }
        }
        moves
    }

    /// Fill gaps left by gravity, row-major.
    ///
    /// Excludes the tags of all occupied neighbours, including cells filled
    /// earlier in the same pass. Returns the filled cells.
    pub fn fill_gaps(&mut self, rng: &mut SimpleRng, views: &mut dyn ViewPool) -> Vec<Coord> {
        let mut filled = Vec::new();
        for idx in 0..self.cells.len() {
            if self.cells[idx].is_some() {
                continue;
            }
            let c = self.coord_of(idx);
            let mut excluded = ArrayVec::<Tag, 4>::new();
            for dir in [Direction::Left, Direction::Down, Direction::Right, Direction::Up] {
                if let Some(tag) = self.neighbor_tag(c, dir) {
                    excluded.push(tag);
                }
            }
            let tag = self.pick_tag(&excluded, rng);
            self.put(idx, ItemKind::Plain(tag), views);
            filled.push(c);
        }
        filled
    }

    /// Uniformly permute every slot. Items keep their ids and views.
    pub fn shuffle(&mut self, rng: &mut SimpleRng) {
        rng.shuffle(&mut self.cells);
    }

    /// Rebuild the board into a match-free layout with a known move.
    ///
    /// Base pattern `(x + 2y) mod n` has no equal orthogonal neighbours for
    /// `n >= 3`. A run of `min - 1` equal items is planted along the bottom
    /// row with the missing item one cell above its end, so swapping
    /// `(min - 1, 0)` with `(min - 1, 1)` completes a match. Colours are
    /// relabelled by a random permutation of the palette.
    pub fn regenerate(&mut self, rng: &mut SimpleRng, views: &mut dyn ViewPool) {
        let n = self.palette.len();
        let min = self.min_match as usize;
        let mut relabel: ArrayVec<Tag, 7> = self.palette.iter().copied().collect();
        rng.shuffle(&mut relabel);

        let planted = if (min - 1) % n == 0 { 1 } else { 0 };
        self.release_all(views);
        for idx in 0..self.cells.len() {
            let c = self.coord_of(idx);
            let (x, y) = (c.x as usize, c.y as usize);
            let mut v = (x + 2 * y) % n;
            if (y == 0 && x < min - 1) || (y == 1 && x == min - 1) {
                v = planted;
            }
            self.put(idx, ItemKind::Plain(relabel[v]), views);
        }
    }

    /// Restore the exact layout captured by the first fill.
    ///
    /// All current items are released first; every cell then receives a new
    /// item of the recorded kind.
    pub fn restart(&mut self, views: &mut dyn ViewPool) -> CoreResult<()> {
        let original = self
            .original
            .take()
            .ok_or(CoreError::EmptyOriginalFormation)?;
        self.release_all(views);
        for (idx, kind) in original.iter().enumerate() {
            self.put(idx, *kind, views);
        }
        self.original = Some(original);
        Ok(())
    }

    /// Exchange the items of two neighbouring cells.
    pub fn swap(&mut self, a: Coord, b: Coord) -> CoreResult<()> {
        let ia = self.index(a).ok_or(CoreError::OutOfBounds(a))?;
        let ib = self.index(b).ok_or(CoreError::OutOfBounds(b))?;
        if !a.is_adjacent(b) {
            return Err(CoreError::NotAdjacent { a, b });
        }
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Release every item. The grid is consumed.
    pub fn clear(mut self, views: &mut dyn ViewPool) {
        self.release_all(views);
    }

    fn release_all(&mut self, views: &mut dyn ViewPool) {
        for slot in self.cells.iter_mut() {
            if let Some(slot) = slot.take() {
                views.release_view(slot.view);
            }
        }
    }

    fn put(&mut self, idx: usize, kind: ItemKind, views: &mut dyn ViewPool) -> Item {
        if let Some(old) = self.cells[idx].take() {
            views.release_view(old.view);
        }
        self.next_id = self.next_id.wrapping_add(1);
        let item = Item {
            id: ItemId(self.next_id),
            kind,
        };
        let view = views.acquire_view(&item);
        self.cells[idx] = Some(Slot { item, view });
        item
    }

    fn neighbor_tag(&self, c: Coord, dir: Direction) -> Option<Tag> {
        self.neighbor(c, dir)
            .and_then(|n| self.kind_at(n))
            .and_then(|k| k.tag())
    }

    /// Uniform pick from the palette minus `excluded`; the whole palette when
    /// the exclusion leaves nothing.
    fn pick_tag(&self, excluded: &[Tag], rng: &mut SimpleRng) -> Tag {
        let candidates: ArrayVec<Tag, 7> = self
            .palette
            .iter()
            .copied()
            .filter(|t| !excluded.contains(t))
            .collect();
        let pool: &[Tag] = if candidates.is_empty() {
            self.palette
        } else {
            &candidates
        };
        rng.choose(pool).copied().unwrap_or(Tag::Red)
    }

    /// Layout of a full grid; bonus cells are recorded as-is.
    fn plain_layout(&self) -> Vec<ItemKind> {
        self.cells
            .iter()
            .filter_map(|s| s.map(|s| s.item.kind))
            .collect()
    }
}
