//! Cascade pipeline - the swap/resolve/collapse/refill state machine
//!
//! The pipeline never waits. Each call to [`Cascade::advance`] performs the
//! work of exactly one phase boundary and returns the [`Step`] it took; the
//! driver sleeps `step.settle_ms()` (animation time) before advancing again.
//! Grid mutation only happens inside `request_swap`, `advance`, `restart`
//! and `halt`, so a boundary is never observed mid-mutation.
//!
//! ```text
//! Idle/AwaitingSwap --swap--> Resolving --no match--> Idle (swap reverted)
//!                                 |
//!                                 v
//!                            Collapsing --> Refilling (shift, fill) --> Rescanning
//!                                 ^                                      |   |   |
//!                                 +-------------- match -----------------+   |   |
//!                                                             moves -> Idle  |   |
//!                                             Shuffling <-- no moves --------+   |
//!                                                 +------> Rescanning            |
//!                                                              halt -> Halted <--+
//! ```

use arrayvec::ArrayVec;

use crate::collab::ViewPool;
use crate::config::BoardConfig;
use crate::error::{CoreError, CoreResult};
use crate::grid::Grid;
use crate::matcher::{bonus_area, merge_into, MatchFinder};
use crate::rng::SimpleRng;
use crate::snapshot::BoardSnapshot;
use crate::types::{BonusKind, CascadeEvent, Coord, ItemKind, MatchDirection, Phase, Step};

/// Work carried from one boundary to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    None,
    Swap {
        a: Coord,
        b: Coord,
    },
    Clear {
        cells: Vec<Coord>,
        promote: Option<(Coord, BonusKind)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefillStep {
    Shift,
    Fill,
}

/// Running totals since construction (restart keeps them).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeStats {
    pub moves_resolved: u32,
    pub swaps_rejected: u32,
    pub items_cleared: u32,
    pub bonuses_triggered: u32,
    pub revision: u64,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    grid: Grid,
    finder: MatchFinder,
    rng: SimpleRng,
    config: BoardConfig,
    phase: Phase,
    pending: Pending,
    refill: RefillStep,
    events: Vec<CascadeEvent>,
    hint: ArrayVec<Coord, 3>,
    chain: u32,
    shuffles: u32,
    halt_requested: bool,
    move_in_flight: bool,
    stats: CascadeStats,
}

impl Cascade {
    /// Build, fill and start stabilising a board.
    ///
    /// The fresh board is match-free, so the first `advance` rescans it and
    /// settles in `Idle` with a hint, or shuffles if it happens to be stuck.
    pub fn new(config: BoardConfig, views: &mut dyn ViewPool) -> CoreResult<Self> {
        config.validate()?;
        let mut grid = Grid::build(config.board_width, config.board_height, config.min_match_length)?
            .with_palette(config.palette());
        let mut rng = SimpleRng::new(config.seed);
        grid.fill(&mut rng, views);

        let mut cascade = Self::assemble(grid, config, rng);
        cascade.enter(Phase::Rescanning, &[], views);
        Ok(cascade)
    }

    /// Wrap an existing grid, starting in `Idle`.
    ///
    /// The board is taken as-is (it may even contain matches); this is how
    /// exact layouts are set up for replays and tests.
    pub fn from_grid(grid: Grid, seed: u32) -> Self {
        let config = BoardConfig {
            board_width: grid.width(),
            board_height: grid.height(),
            min_match_length: grid.min_match(),
            tag_count: grid.palette().len() as u8,
            seed,
            ..BoardConfig::default()
        };
        let mut cascade = Self::assemble(grid, config, SimpleRng::new(seed));
        cascade.hint = cascade.finder.potential_moves(&cascade.grid);
        cascade
    }

    pub fn with_max_shuffles(mut self, max_shuffles: u32) -> Self {
        self.config.max_shuffles = max_shuffles;
        self
    }

    fn assemble(grid: Grid, config: BoardConfig, rng: SimpleRng) -> Self {
        Self {
            finder: MatchFinder::new(grid.min_match()),
            grid,
            rng,
            config,
            phase: Phase::Idle,
            pending: Pending::None,
            refill: RefillStep::Shift,
            events: Vec::new(),
            hint: ArrayVec::new(),
            chain: 0,
            shuffles: 0,
            halt_requested: false,
            move_in_flight: false,
            stats: CascadeStats::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn finder(&self) -> &MatchFinder {
        &self.finder
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Potential move surfaced by the last stabilisation.
    pub fn hint(&self) -> &[Coord] {
        &self.hint
    }

    pub fn chain(&self) -> u32 {
        self.chain
    }

    pub fn stats(&self) -> CascadeStats {
        self.stats
    }

    pub fn halt_requested(&self) -> bool {
        self.halt_requested
    }

    /// The input side picked the first cell of a swap.
    pub fn await_swap(&mut self, views: &mut dyn ViewPool) -> CoreResult<()> {
        match self.phase {
            Phase::Idle => {
                self.enter(Phase::AwaitingSwap, &[], views);
                Ok(())
            }
            Phase::AwaitingSwap => Ok(()),
            Phase::Halted => Err(CoreError::Halted),
            phase => Err(CoreError::Busy(phase)),
        }
    }

    /// Drop a half-made swap selection.
    pub fn cancel_swap(&mut self, views: &mut dyn ViewPool) {
        if self.phase == Phase::AwaitingSwap {
            self.enter(Phase::Idle, &[], views);
        }
    }

    /// Swap two neighbouring cells and start resolving.
    ///
    /// Rejected requests leave the grid and the phase untouched. An accepted
    /// swap returns `Step::Swap`; whether it produced a match is only known
    /// after the next `advance`.
    pub fn request_swap(&mut self, a: Coord, b: Coord, views: &mut dyn ViewPool) -> CoreResult<Step> {
        match self.phase {
            Phase::Halted => return Err(CoreError::Halted),
            phase if !phase.accepts_swap() => return Err(CoreError::Busy(phase)),
            _ => {}
        }
        self.grid.swap(a, b)?;

        self.hint.clear();
        self.chain = 0;
        self.move_in_flight = true;
        self.pending = Pending::Swap { a, b };
        self.events.push(CascadeEvent::Swapped { a, b });
        self.enter(Phase::Resolving, &[a, b], views);
        Ok(Step::Swap)
    }

    /// Perform the work of the current phase and move to the next one.
    ///
    /// Returns `None` when there is nothing to do (`Idle`, `AwaitingSwap`,
    /// `Halted`).
    pub fn advance(&mut self, views: &mut dyn ViewPool) -> Option<Step> {
        match self.phase {
            Phase::Idle | Phase::AwaitingSwap | Phase::Halted => None,
            Phase::Resolving => Some(self.resolve(views)),
            Phase::Collapsing => Some(self.collapse(views)),
            Phase::Refilling => Some(self.refill(views)),
            Phase::Rescanning => Some(self.rescan(views)),
            Phase::Shuffling => Some(self.shuffle(views)),
        }
    }

    /// Advance until the pipeline rests. Returns the steps taken.
    pub fn run_until_idle(&mut self, views: &mut dyn ViewPool) -> Vec<Step> {
        let mut steps = Vec::new();
        while let Some(step) = self.advance(views) {
            steps.push(step);
        }
        steps
    }

    /// Drain events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<CascadeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[CascadeEvent] {
        &self.events
    }

    /// Game-over cancellation.
    ///
    /// At rest the pipeline parks in `Halted` at once. During a cascade the
    /// request is remembered: running collapse and refill work finishes, and
    /// the pipeline parks at the next rescan or shuffle boundary (or right
    /// after a rejected swap is reverted), so the grid is always full when it
    /// stops.
    pub fn halt(&mut self, views: &mut dyn ViewPool) -> Option<Step> {
        match self.phase {
            Phase::Halted => None,
            Phase::Idle | Phase::AwaitingSwap => Some(self.park(views)),
            _ => {
                self.halt_requested = true;
                None
            }
        }
    }

    /// Restore the original formation and re-stabilise from `Rescanning`.
    ///
    /// Allowed at any boundary; pending cascade work and a halt are dropped.
    pub fn restart(&mut self, views: &mut dyn ViewPool) -> CoreResult<()> {
        self.grid.restart(views)?;
        self.pending = Pending::None;
        self.refill = RefillStep::Shift;
        self.hint.clear();
        self.chain = 0;
        self.shuffles = 0;
        self.halt_requested = false;
        self.move_in_flight = false;
        self.events.push(CascadeEvent::Restarted);
        self.enter(Phase::Rescanning, &[], views);
        Ok(())
    }

    /// Release every item. The pipeline is consumed.
    pub fn clear(self, views: &mut dyn ViewPool) {
        self.grid.clear(views);
    }

    pub fn snapshot_into(&self, out: &mut BoardSnapshot) {
        out.width = self.grid.width();
        out.height = self.grid.height();
        out.cells.clear();
        out.cells.extend(
            self.grid
                .kinds()
                .into_iter()
                .map(|k| k.map(ItemKind::code).unwrap_or(crate::types::EMPTY_CODE)),
        );
        out.rehash();
        out.phase = self.phase;
        out.busy = self.phase.is_busy();
        out.hint.clear();
        out.hint.extend_from_slice(&self.hint);
        out.chain = self.chain;
        out.shuffles = self.shuffles;
        out.moves_resolved = self.stats.moves_resolved;
        out.swaps_rejected = self.stats.swaps_rejected;
        out.items_cleared = self.stats.items_cleared;
        out.revision = self.stats.revision;
        out.seed = self.config.seed;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut s = BoardSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    fn enter(&mut self, phase: Phase, cells: &[Coord], views: &mut dyn ViewPool) {
        self.phase = phase;
        self.stats.revision += 1;
        views.notify_phase(phase, cells);
    }

    fn park(&mut self, views: &mut dyn ViewPool) -> Step {
        self.halt_requested = false;
        self.pending = Pending::None;
        self.events.push(CascadeEvent::Halted);
        self.enter(Phase::Halted, &[], views);
        Step::Halt
    }

    fn resolve(&mut self, views: &mut dyn ViewPool) -> Step {
        let Pending::Swap { a, b } = std::mem::replace(&mut self.pending, Pending::None) else {
            self.enter(Phase::Rescanning, &[], views);
            return Step::Resolve;
        };

        let bonuses: ArrayVec<(Coord, BonusKind), 2> = [a, b]
            .into_iter()
            .filter_map(|c| match self.grid.kind_at(c) {
                Some(ItemKind::Bonus(kind)) => Some((c, kind)),
                _ => None,
            })
            .collect();

        if !bonuses.is_empty() {
            let mut cells = Vec::new();
            for (at, kind) in bonuses {
                let area = bonus_area(&self.grid, at, kind);
                merge_into(&mut cells, &area);
                self.stats.bonuses_triggered += 1;
                self.events.push(CascadeEvent::BonusTriggered {
                    at,
                    kind,
                    cells: area,
                });
            }
            self.enter(Phase::Collapsing, &cells, views);
            self.pending = Pending::Clear {
                cells,
                promote: None,
            };
            return Step::Resolve;
        }

        let mut cells = self.finder.matches_at(&self.grid, a);
        merge_into(&mut cells, &self.finder.matches_at(&self.grid, b));
        let cells = self.finder.filter_bonus_compatible(&self.grid, &cells);
        let direction = self.finder.classify_direction(&cells);
        let min = self.finder.min_len();

        let accepted = cells.len() > min || (cells.len() == min && direction != MatchDirection::None);
        if !accepted {
            // Both cells were validated when the swap was accepted.
            let reverted = self.grid.swap(a, b);
            debug_assert!(reverted.is_ok(), "revert of an accepted swap failed: {reverted:?}");
            self.stats.swaps_rejected += 1;
            self.move_in_flight = false;
            self.hint = self.finder.potential_moves(&self.grid);
            self.events.push(CascadeEvent::SwapRejected { a, b });
            if self.halt_requested {
                self.park(views);
            } else {
                self.enter(Phase::Idle, &[a, b], views);
            }
            return Step::Revert;
        }

        let target = if cells.contains(&b) { b } else { a };
        let promote = if cells.len() > min {
            direction.bonus_kind().map(|kind| (target, kind))
        } else {
            None
        };
        self.events.push(CascadeEvent::Matched {
            cells: cells.clone(),
            direction,
            chain: 0,
        });
        self.enter(Phase::Collapsing, &cells, views);
        self.pending = Pending::Clear { cells, promote };
        Step::Resolve
    }

    fn collapse(&mut self, views: &mut dyn ViewPool) -> Step {
        let Pending::Clear { cells, promote } = std::mem::replace(&mut self.pending, Pending::None) else {
            self.refill = RefillStep::Shift;
            self.enter(Phase::Refilling, &[], views);
            return Step::Explode;
        };

        for c in &cells {
            if self.grid.explode(*c, views).is_some() {
                self.stats.items_cleared += 1;
            }
        }
        if let Some((at, kind)) = promote {
            if self.grid.place(at, ItemKind::Bonus(kind), views).is_ok() {
                self.events.push(CascadeEvent::Promoted { at, kind });
            }
        }

        self.refill = RefillStep::Shift;
        self.enter(Phase::Refilling, &cells, views);
        Step::Explode
    }

    fn refill(&mut self, views: &mut dyn ViewPool) -> Step {
        match self.refill {
            RefillStep::Shift => {
                let moves = self.grid.shift_down();
                let landed: Vec<Coord> = moves.iter().map(|(_, to)| *to).collect();
                self.events.push(CascadeEvent::Shifted {
                    moved: moves.len() as u32,
                });
                self.refill = RefillStep::Fill;
                self.stats.revision += 1;
                views.notify_phase(Phase::Refilling, &landed);
                Step::Shift
            }
            RefillStep::Fill => {
                let filled = self.grid.fill_gaps(&mut self.rng, views);
                self.events.push(CascadeEvent::Refilled {
                    cells: filled.clone(),
                });
                self.refill = RefillStep::Shift;
                self.enter(Phase::Rescanning, &filled, views);
                Step::Fill
            }
        }
    }

    fn rescan(&mut self, views: &mut dyn ViewPool) -> Step {
        if self.halt_requested {
            return self.park(views);
        }

        let cells = self.finder.first_match(&self.grid);
        if !cells.is_empty() {
            self.chain += 1;
            let direction = self.finder.classify_direction(&cells);
            let promote = if cells.len() > self.finder.min_len() {
                direction
                    .bonus_kind()
                    .and_then(|kind| self.rng.choose(&cells).map(|at| (*at, kind)))
            } else {
                None
            };
            self.events.push(CascadeEvent::Matched {
                cells: cells.clone(),
                direction,
                chain: self.chain,
            });
            self.enter(Phase::Collapsing, &cells, views);
            self.pending = Pending::Clear { cells, promote };
            return Step::Rescan;
        }

        let hint = self.finder.potential_moves(&self.grid);
        if hint.is_empty() {
            self.events.push(CascadeEvent::NoMoves);
            self.enter(Phase::Shuffling, &[], views);
            return Step::Rescan;
        }

        self.shuffles = 0;
        self.chain = 0;
        self.events.push(CascadeEvent::Stable {
            hint: hint.to_vec(),
        });
        if self.move_in_flight {
            self.move_in_flight = false;
            self.stats.moves_resolved += 1;
            self.events.push(CascadeEvent::MoveResolved);
        }
        self.enter(Phase::Idle, &hint, views);
        self.hint = hint;
        Step::Rescan
    }

    fn shuffle(&mut self, views: &mut dyn ViewPool) -> Step {
        if self.halt_requested {
            return self.park(views);
        }

        self.shuffles += 1;
        if self.shuffles > self.config.max_shuffles {
            self.grid.regenerate(&mut self.rng, views);
            self.shuffles = 0;
            self.events.push(CascadeEvent::Regenerated);
        } else {
            self.grid.shuffle(&mut self.rng);
            self.events.push(CascadeEvent::Shuffled {
                attempt: self.shuffles,
            });
        }
        self.enter(Phase::Rescanning, &[], views);
        Step::Shuffle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::HeadlessViews;
    use crate::types::PALETTE;

    fn cascade(rows: &[&str], views: &mut HeadlessViews) -> Cascade {
        Cascade::from_grid(Grid::from_rows(rows, 3, views).unwrap(), 7)
    }

    #[test]
    fn new_board_settles_idle_with_hint() {
        let mut views = HeadlessViews::new();
        let mut c = Cascade::new(BoardConfig::default().with_seed(3), &mut views).unwrap();
        assert_eq!(c.phase(), Phase::Rescanning);
        c.run_until_idle(&mut views);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.hint().is_empty());
        assert!(c.grid().is_full());
        assert_eq!(views.live(), 64);
    }

    #[test]
    fn busy_pipeline_rejects_swaps() {
        let mut views = HeadlessViews::new();
        let mut c = cascade(&["GBY", "BGY", "RRY"], &mut views);
        c.request_swap(Coord::new(0, 0), Coord::new(0, 1), &mut views).unwrap();
        assert!(c.is_busy());
        assert_eq!(
            c.request_swap(Coord::new(1, 1), Coord::new(1, 2), &mut views),
            Err(CoreError::Busy(Phase::Resolving))
        );
    }

    #[test]
    fn unmatched_swap_is_reverted() {
        let mut views = HeadlessViews::new();
        let mut c = cascade(&["GBG", "BGB", "RYR"], &mut views);
        let before = c.grid().kinds();
        assert_eq!(
            c.request_swap(Coord::new(0, 0), Coord::new(1, 0), &mut views),
            Ok(Step::Swap)
        );
        assert_eq!(c.advance(&mut views), Some(Step::Revert));
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.grid().kinds(), before);
        assert_eq!(c.pending_events().len(), 2);
        let events = c.take_events();
        assert!(c.pending_events().is_empty());
        assert_eq!(events.last().map(CascadeEvent::name), Some("swapRejected"));
        assert_eq!(c.stats().swaps_rejected, 1);
    }

    #[test]
    fn halt_at_rest_parks_immediately() {
        let mut views = HeadlessViews::new();
        let mut c = cascade(&["GBG", "BGB", "RYR"], &mut views);
        assert_eq!(c.halt(&mut views), Some(Step::Halt));
        assert_eq!(c.phase(), Phase::Halted);
        assert_eq!(
            c.request_swap(Coord::new(0, 0), Coord::new(1, 0), &mut views),
            Err(CoreError::Halted)
        );
        c.restart(&mut views).unwrap();
        assert_eq!(c.phase(), Phase::Rescanning);
    }

    #[test]
    fn halt_mid_cascade_finishes_refill_first() {
        let mut views = HeadlessViews::new();
        let mut c = cascade(&["GBY", "BGR", "RRY"], &mut views);
        c.request_swap(Coord::new(2, 0), Coord::new(2, 1), &mut views).unwrap();
        assert_eq!(c.advance(&mut views), Some(Step::Resolve));
        assert_eq!(c.phase(), Phase::Collapsing);
        assert_eq!(c.halt(&mut views), None);
        let steps = c.run_until_idle(&mut views);
        assert_eq!(steps.last(), Some(&Step::Halt));
        assert_eq!(c.phase(), Phase::Halted);
        assert!(c.grid().is_full());
    }

    #[test]
    fn await_swap_is_not_busy() {
        let mut views = HeadlessViews::new();
        let mut c = cascade(&["GBG", "BGB", "RYR"], &mut views);
        c.await_swap(&mut views).unwrap();
        assert_eq!(c.phase(), Phase::AwaitingSwap);
        assert!(!c.is_busy());
        c.cancel_swap(&mut views);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn regenerates_after_max_shuffles() {
        let mut views = HeadlessViews::new();
        // Three tags on a 3x3 board in a Latin square: no move exists and
        // every shuffle draws from the same three-per-tag multiset.
        let grid = Grid::from_rows(&["RGB", "GBR", "BRG"], 3, &mut views)
            .unwrap()
            .with_palette(&PALETTE[..3]);
        let mut c = Cascade::from_grid(grid, 11).with_max_shuffles(0);
        assert!(c.hint().is_empty());
        c.restart(&mut views).unwrap();
        c.run_until_idle(&mut views);
        let events = c.take_events();
        assert!(events.contains(&CascadeEvent::NoMoves));
        assert!(events.contains(&CascadeEvent::Regenerated));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.hint().is_empty());
    }
}
