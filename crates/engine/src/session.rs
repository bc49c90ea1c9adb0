//! Fixed-timestep session driver.
//!
//! A [`Session`] owns the cascade and the view pool, and plays the input
//! collaborator: cursor, selection, swap requests, pause and restart. Each
//! `tick` burns the settle delay of the last phase boundary and advances the
//! cascade whenever it has elapsed, so presentation gets its animation time
//! without the rules ever sleeping.

use tui_match3_core::types::{CascadeEvent, Coord, Direction, GameAction, Phase};
use tui_match3_core::{dispatch, BoardConfig, BoardSnapshot, Cascade, CoreError, CoreResult, GameObserver, ViewPool};

pub struct Session<V: ViewPool> {
    cascade: Cascade,
    views: V,
    cursor: Coord,
    selected: Option<Coord>,
    /// Remaining animation time of the last boundary
    settle_ms: u32,
    /// Time spent at rest since the last swap
    idle_ms: u32,
    hint_delay_ms: u32,
    hint_forced: bool,
    paused: bool,
    episode_id: u32,
}

impl<V: ViewPool> Session<V> {
    pub fn new(config: BoardConfig, mut views: V) -> CoreResult<Self> {
        let hint_delay_ms = config.hint_delay_ms();
        let cascade = Cascade::new(config, &mut views)?;
        Ok(Self::with_cascade(cascade, views, hint_delay_ms))
    }

    /// Drive an existing cascade (exact layouts, replays).
    pub fn with_cascade(cascade: Cascade, views: V, hint_delay_ms: u32) -> Self {
        let grid = cascade.grid();
        let cursor = Coord::new(grid.width() / 2, grid.height() / 2);
        Self {
            cascade,
            views,
            cursor,
            selected: None,
            settle_ms: 0,
            idle_ms: 0,
            hint_delay_ms,
            hint_forced: false,
            paused: false,
            episode_id: 0,
        }
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    pub fn views(&self) -> &V {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut V {
        &mut self.views
    }

    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    pub fn selected(&self) -> Option<Coord> {
        self.selected
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> Phase {
        self.cascade.phase()
    }

    pub fn is_game_over(&self) -> bool {
        self.cascade.phase() == Phase::Halted
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    /// Animation time left before the next boundary.
    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    /// The hint, once the player has been idle for the configured delay (or
    /// asked for it).
    pub fn hint_visible(&self) -> Option<&[Coord]> {
        let hint = self.cascade.hint();
        let due = self.hint_forced || self.idle_ms >= self.hint_delay_ms;
        if due && !hint.is_empty() && self.cascade.phase().accepts_swap() {
            Some(hint)
        } else {
            None
        }
    }

    /// Advance the session by `elapsed_ms`.
    ///
    /// Runs every boundary whose settle delay has elapsed and forwards the
    /// resulting events to `observer`. Returns the events as well.
    pub fn tick(&mut self, elapsed_ms: u32, observer: &mut dyn GameObserver) -> Vec<CascadeEvent> {
        if self.paused {
            return Vec::new();
        }

        let mut budget = elapsed_ms;
        loop {
            if self.settle_ms > 0 {
                let used = self.settle_ms.min(budget);
                self.settle_ms -= used;
                budget -= used;
                if self.settle_ms > 0 {
                    break;
                }
            }
            match self.cascade.advance(&mut self.views) {
                Some(step) => self.settle_ms = step.settle_ms(),
                None => break,
            }
        }

        if self.cascade.phase().accepts_swap() {
            self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        }

        let events = self.cascade.take_events();
        dispatch(&events, observer);
        events
    }

    /// Apply a player/AI action.
    ///
    /// `Pause` and `Restart` are always accepted; everything else fails with
    /// `Paused` while paused.
    pub fn apply_action(&mut self, action: GameAction) -> CoreResult<()> {
        match action {
            GameAction::Pause => {
                self.paused = !self.paused;
                return Ok(());
            }
            GameAction::Restart => return self.restart(),
            _ => {}
        }
        if self.paused {
            return Err(CoreError::Paused);
        }

        match action {
            GameAction::CursorUp => self.move_cursor(Direction::Up),
            GameAction::CursorDown => self.move_cursor(Direction::Down),
            GameAction::CursorLeft => self.move_cursor(Direction::Left),
            GameAction::CursorRight => self.move_cursor(Direction::Right),
            GameAction::Select => return self.select(),
            GameAction::Swap(dir) => {
                let target = self
                    .cascade
                    .grid()
                    .neighbor(self.cursor, dir)
                    .ok_or(CoreError::OutOfBounds(self.cursor))?;
                let from = self.cursor;
                self.request_swap(from, target)?;
                self.cursor = target;
            }
            GameAction::Hint => self.hint_forced = true,
            GameAction::Pause | GameAction::Restart => {}
        }
        Ok(())
    }

    /// Swap two cells directly (AI and remote control path).
    pub fn request_swap(&mut self, a: Coord, b: Coord) -> CoreResult<()> {
        if self.paused {
            return Err(CoreError::Paused);
        }
        self.selected = None;
        match self.cascade.request_swap(a, b, &mut self.views) {
            Ok(step) => {
                self.settle_ms = step.settle_ms();
                self.idle_ms = 0;
                self.hint_forced = false;
                Ok(())
            }
            Err(err) => {
                self.cascade.cancel_swap(&mut self.views);
                Err(err)
            }
        }
    }

    /// Restore the original formation and start a new episode.
    pub fn restart(&mut self) -> CoreResult<()> {
        self.cascade.restart(&mut self.views)?;
        self.selected = None;
        self.settle_ms = 0;
        self.idle_ms = 0;
        self.hint_forced = false;
        self.paused = false;
        self.episode_id = self.episode_id.wrapping_add(1);
        Ok(())
    }

    /// Game over. Parks the cascade once running work has settled.
    pub fn game_over(&mut self) {
        self.selected = None;
        if let Some(step) = self.cascade.halt(&mut self.views) {
            self.settle_ms = step.settle_ms();
        }
    }

    pub fn snapshot_into(&self, out: &mut BoardSnapshot) {
        self.cascade.snapshot_into(out);
        out.hint.clear();
        if let Some(hint) = self.hint_visible() {
            out.hint.extend_from_slice(hint);
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut s = BoardSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Release every item and hand the view pool back.
    pub fn clear(mut self) -> V {
        self.cascade.clear(&mut self.views);
        self.views
    }

    fn move_cursor(&mut self, dir: Direction) {
        if let Some(next) = self.cascade.grid().neighbor(self.cursor, dir) {
            self.cursor = next;
        }
    }

    fn select(&mut self) -> CoreResult<()> {
        let cursor = self.cursor;
        match self.selected {
            None => {
                self.cascade.await_swap(&mut self.views)?;
                self.selected = Some(cursor);
                Ok(())
            }
            Some(sel) if sel == cursor => {
                self.selected = None;
                self.cascade.cancel_swap(&mut self.views);
                Ok(())
            }
            Some(sel) if sel.is_adjacent(cursor) => self.request_swap(sel, cursor),
            Some(_) => {
                self.selected = Some(cursor);
                Ok(())
            }
        }
    }
}
