//! Collaborator contracts.
//!
//! The engine never owns presentation or game-state logic. It talks to them
//! through these traits, injected by the driver:
//!
//! - [`ViewPool`]: hands out an opaque handle per live item and hears about
//!   phase boundaries so it can animate.
//! - [`GameObserver`]: hears when a move has fully settled and when the board
//!   ran out of moves (move counters, timers, game over live there).

use crate::types::{CascadeEvent, Coord, Item, Phase, ViewHandle};

/// Presentation pool.
///
/// Implementations are expected to pool by item kind rather than allocate a
/// fresh view per item. The engine treats handles opaquely and releases every
/// handle it acquired exactly once.
pub trait ViewPool {
    fn acquire_view(&mut self, item: &Item) -> ViewHandle;

    fn release_view(&mut self, handle: ViewHandle);

    /// Fire-and-forget phase boundary notification.
    fn notify_phase(&mut self, _phase: Phase, _cells: &[Coord]) {}
}

/// Game-state collaborator.
pub trait GameObserver {
    fn on_move_resolved(&mut self) {}

    fn on_no_moves(&mut self) {}

    /// Every event, including the two above.
    fn on_event(&mut self, _event: &CascadeEvent) {}
}

impl GameObserver for () {}

/// Route drained events to an observer.
pub fn dispatch(events: &[CascadeEvent], observer: &mut dyn GameObserver) {
    for event in events {
        observer.on_event(event);
        match event {
            CascadeEvent::MoveResolved => observer.on_move_resolved(),
            CascadeEvent::NoMoves => observer.on_no_moves(),
            _ => {}
        }
    }
}

/// View pool without presentation: counts handles and remembers the last
/// phase boundary. Used headless (tests, benches, AI-only runs).
#[derive(Debug, Default, Clone)]
pub struct HeadlessViews {
    next: u64,
    live: usize,
    notifications: u64,
    last_phase: Option<Phase>,
}

impl HeadlessViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles acquired and not yet released.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }

    pub fn last_phase(&self) -> Option<Phase> {
        self.last_phase
    }
}

impl ViewPool for HeadlessViews {
    fn acquire_view(&mut self, _item: &Item) -> ViewHandle {
        self.next += 1;
        self.live += 1;
        ViewHandle(self.next)
    }

    fn release_view(&mut self, _handle: ViewHandle) {
        self.live = self.live.saturating_sub(1);
    }

    fn notify_phase(&mut self, phase: Phase, _cells: &[Coord]) {
        self.notifications += 1;
        self.last_phase = Some(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, ItemKind, Tag};

    #[derive(Default)]
    struct Counter {
        resolved: u32,
        no_moves: u32,
        seen: u32,
    }

    impl GameObserver for Counter {
        fn on_move_resolved(&mut self) {
            self.resolved += 1;
        }

        fn on_no_moves(&mut self) {
            self.no_moves += 1;
        }

        fn on_event(&mut self, _event: &CascadeEvent) {
            self.seen += 1;
        }
    }

    #[test]
    fn dispatch_routes_callbacks() {
        let events = vec![
            CascadeEvent::Shifted { moved: 2 },
            CascadeEvent::NoMoves,
            CascadeEvent::MoveResolved,
            CascadeEvent::MoveResolved,
        ];
        let mut counter = Counter::default();
        dispatch(&events, &mut counter);
        assert_eq!(counter.resolved, 2);
        assert_eq!(counter.no_moves, 1);
        assert_eq!(counter.seen, 4);
    }

    #[test]
    fn headless_views_track_live_handles() {
        let mut views = HeadlessViews::new();
        let item = Item {
            id: ItemId(1),
            kind: ItemKind::Plain(Tag::Red),
        };
        let a = views.acquire_view(&item);
        let b = views.acquire_view(&item);
        assert_ne!(a, b);
        assert_eq!(views.live(), 2);
        views.release_view(a);
        assert_eq!(views.live(), 1);
        views.notify_phase(Phase::Refilling, &[]);
        assert_eq!(views.last_phase(), Some(Phase::Refilling));
    }
}
