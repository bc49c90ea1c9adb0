//! Match detection - runs, match direction and move lookahead
//!
//! Everything here is a pure function over grid state. Lookahead simulates
//! swaps through a kind lookup instead of mutating the grid.

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::{same_type, BonusKind, Coord, Direction, ItemKind, MatchDirection, ALL_BONUS_THRESHOLD};

/// A swap that would create a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotentialMove {
    /// Cells that end up in the run (pattern moves list three)
    pub cells: ArrayVec<Coord, 3>,
    /// The swap realizing it
    pub from: Coord,
    pub to: Coord,
}

/// Run detection parameterised by the minimum match length.
#[derive(Debug, Clone, Copy)]
pub struct MatchFinder {
    min_len: usize,
}

impl MatchFinder {
    pub fn new(min_len: u8) -> Self {
        Self {
            min_len: min_len as usize,
        }
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Seed, then cells to the right, then cells to the left.
    pub fn horizontal_run(&self, grid: &Grid, seed: Coord) -> Vec<Coord> {
        run_by(grid, seed, Direction::Right, Direction::Left, |c| grid.kind_at(c))
    }

    /// Seed, then cells above, then cells below.
    pub fn vertical_run(&self, grid: &Grid, seed: Coord) -> Vec<Coord> {
        run_by(grid, seed, Direction::Up, Direction::Down, |c| grid.kind_at(c))
    }

    /// Matches through one cell: the horizontal run if long enough, merged
    /// with the vertical run if long enough. Empty when neither qualifies.
    pub fn matches_at(&self, grid: &Grid, c: Coord) -> Vec<Coord> {
        let mut cells = Vec::new();
        let horizontal = self.horizontal_run(grid, c);
        if horizontal.len() >= self.min_len {
            cells = horizontal;
        }
        let vertical = self.vertical_run(grid, c);
        if vertical.len() >= self.min_len {
            merge_into(&mut cells, &vertical);
        }
        cells
    }

    /// Shape of a match set, relative to its first cell.
    pub fn classify_direction(&self, cells: &[Coord]) -> MatchDirection {
        if cells.len() < self.min_len || cells.is_empty() {
            return MatchDirection::None;
        }
        let seed = cells[0];
        if cells.iter().all(|c| c.x == seed.x) {
            MatchDirection::Vertical
        } else if cells.iter().all(|c| c.y == seed.y) {
            MatchDirection::Horizontal
        } else if cells.len() > ALL_BONUS_THRESHOLD {
            MatchDirection::All
        } else {
            MatchDirection::None
        }
    }

    /// First qualifying run in row-major order (horizontal before vertical
    /// per cell). Empty when the board is stable.
    pub fn first_match(&self, grid: &Grid) -> Vec<Coord> {
        for c in grid.coords() {
            let horizontal = self.horizontal_run(grid, c);
            if horizontal.len() >= self.min_len {
                return horizontal;
            }
            let vertical = self.vertical_run(grid, c);
            if vertical.len() >= self.min_len {
                return vertical;
            }
        }
        Vec::new()
    }

    /// Drop bonus cells whose effect does not line up with the match shape.
    ///
    /// Plain cells always stay. A row bonus survives only in a horizontal
    /// match, a column bonus in a vertical one, an all-clear bonus in an
    /// `All` match. Sets without bonus cells are returned unchanged.
    pub fn filter_bonus_compatible(&self, grid: &Grid, cells: &[Coord]) -> Vec<Coord> {
        let has_bonus = cells
            .iter()
            .any(|c| matches!(grid.kind_at(*c), Some(k) if k.is_bonus()));
        if !has_bonus {
            return cells.to_vec();
        }
        let allowed = self.classify_direction(cells).bonus_kind();
        cells
            .iter()
            .copied()
            .filter(|c| match grid.kind_at(*c) {
                Some(ItemKind::Bonus(kind)) => Some(kind) == allowed,
                _ => true,
            })
            .collect()
    }

    /// First potential move's cells, or empty when no swap creates a match.
    pub fn potential_moves(&self, grid: &Grid) -> ArrayVec<Coord, 3> {
        self.find_move(grid).map(|m| m.cells).unwrap_or_default()
    }

    /// First swap that creates a match.
    ///
    /// Each cell is probed, in row-major order, for a same-type neighbour
    /// pair whose line can be completed by pulling a third item in
    /// (right, up, down, left), then for a same-type pair with a one-cell gap
    /// that a perpendicular neighbour can fill (horizontal, then vertical).
    /// Every candidate is confirmed by a simulated swap. With a minimum
    /// longer than three the patterns cannot see far enough, so every
    /// adjacent swap is simulated instead.
    pub fn find_move(&self, grid: &Grid) -> Option<PotentialMove> {
        if self.min_len > 3 {
            return self.find_move_exhaustive(grid);
        }
        for c in grid.coords() {
            let Some(kind) = grid.kind_at(c) else {
                continue;
            };

            for dir in [Direction::Right, Direction::Up, Direction::Down, Direction::Left] {
                if let Some(m) = self.line_pattern(grid, c, kind, dir) {
                    return Some(m);
                }
            }
            for (along, across) in [(Direction::Right, Direction::Up), (Direction::Up, Direction::Right)] {
                if let Some(m) = self.gap_pattern(grid, c, kind, along, across) {
                    return Some(m);
                }
            }
        }
        None
    }

    /// Whether swapping `a` and `b` would leave a qualifying run through
    /// either cell. The grid is not touched.
    pub fn swap_creates_match(&self, grid: &Grid, a: Coord, b: Coord) -> bool {
        if !grid.are_adjacent(a, b) {
            return false;
        }
        let (ka, kb) = (grid.kind_at(a), grid.kind_at(b));
        let lookup = |c: Coord| {
            if c == a {
                kb
            } else if c == b {
                ka
            } else {
                grid.kind_at(c)
            }
        };
        [a, b].iter().any(|seed| {
            run_by(grid, *seed, Direction::Right, Direction::Left, lookup).len() >= self.min_len
                || run_by(grid, *seed, Direction::Up, Direction::Down, lookup).len() >= self.min_len
        })
    }

    /// `c` and its neighbour `n` share a type; the cell past `n` differs but
    /// one of its other neighbours can be swapped into it.
    fn line_pattern(&self, grid: &Grid, c: Coord, kind: ItemKind, dir: Direction) -> Option<PotentialMove> {
        let n = grid.neighbor(c, dir)?;
        if !same_type(kind, grid.kind_at(n)?) {
            return None;
        }
        let target = grid.neighbor(n, dir)?;
        if matches!(grid.kind_at(target), Some(k) if same_type(kind, k)) {
            return None;
        }
        for toward in Direction::ALL {
            let Some(third) = grid.neighbor(target, toward) else {
                continue;
            };
            if third == n {
                continue;
            }
            if matches!(grid.kind_at(third), Some(k) if same_type(kind, k))
                && self.swap_creates_match(grid, third, target)
            {
                return Some(PotentialMove {
                    cells: [c, n, third].into_iter().collect(),
                    from: third,
                    to: target,
                });
            }
        }
        None
    }

    /// `c` and the cell two steps `along` share a type with a differing gap
    /// between them; a neighbour of the gap `across` (either side) fills it.
    fn gap_pattern(
        &self,
        grid: &Grid,
        c: Coord,
        kind: ItemKind,
        along: Direction,
        across: Direction,
    ) -> Option<PotentialMove> {
        let gap = grid.neighbor(c, along)?;
        let far = grid.neighbor(gap, along)?;
        if !same_type(kind, grid.kind_at(far)?) {
            return None;
        }
        if matches!(grid.kind_at(gap), Some(k) if same_type(kind, k)) {
            return None;
        }
        for side in [across, across.opposite()] {
            let Some(second) = grid.neighbor(gap, side) else {
                continue;
            };
            if matches!(grid.kind_at(second), Some(k) if same_type(kind, k))
                && self.swap_creates_match(grid, second, gap)
            {
                return Some(PotentialMove {
                    cells: [c, far, second].into_iter().collect(),
                    from: second,
                    to: gap,
                });
            }
        }
        None
    }

    fn find_move_exhaustive(&self, grid: &Grid) -> Option<PotentialMove> {
        for c in grid.coords() {
            for dir in [Direction::Right, Direction::Up] {
                let Some(n) = grid.neighbor(c, dir) else {
                    continue;
                };
                if self.swap_creates_match(grid, c, n) {
                    return Some(PotentialMove {
                        cells: [c, n].into_iter().collect(),
                        from: c,
                        to: n,
                    });
                }
            }
        }
        None
    }
}

/// Every cell a bonus at `at` clears.
pub fn bonus_area(grid: &Grid, at: Coord, kind: BonusKind) -> Vec<Coord> {
    match kind {
        BonusKind::Row => (0..grid.width()).map(|x| Coord::new(x, at.y)).collect(),
        BonusKind::Column => (0..grid.height()).map(|y| Coord::new(at.x, y)).collect(),
        BonusKind::All => grid.coords().collect(),
    }
}

/// Append cells of `extra` not already in `cells`, keeping order.
pub fn merge_into(cells: &mut Vec<Coord>, extra: &[Coord]) {
    for c in extra {
        if !cells.contains(c) {
            cells.push(*c);
        }
    }
}

fn run_by(
    grid: &Grid,
    seed: Coord,
    forward: Direction,
    back: Direction,
    kind_of: impl Fn(Coord) -> Option<ItemKind>,
) -> Vec<Coord> {
    let mut cells = vec![seed];
    let Some(kind) = kind_of(seed) else {
        return cells;
    };
    for dir in [forward, back] {
        let mut cur = seed;
        while let Some(next) = grid.neighbor(cur, dir) {
            match kind_of(next) {
                Some(k) if same_type(kind, k) => {
                    cells.push(next);
                    cur = next;
                }
                _ => break,
            }
        }
    }
    cells
}
