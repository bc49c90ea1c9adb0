//! End-to-end cascade scenarios on hand-built boards.
//!
//! Boards are pictures, top row first; `(x, y)` has `y = 0` at the bottom.

use tui_match3::core::{dispatch, BoardConfig, Cascade, CoreError, GameObserver, Grid, HeadlessViews};
use tui_match3::types::{BonusKind, CascadeEvent, Coord, ItemKind, MatchDirection, Phase, Step, PALETTE};

fn board(rows: &[&str], views: &mut HeadlessViews) -> Cascade {
    Cascade::from_grid(Grid::from_rows(rows, 3, views).unwrap(), 1234)
}

#[derive(Default)]
struct Counter {
    moves: u32,
    events: u32,
}

impl GameObserver for Counter {
    fn on_move_resolved(&mut self) {
        self.moves += 1;
    }

    fn on_event(&mut self, _event: &CascadeEvent) {
        self.events += 1;
    }
}

#[test]
fn three_match_explodes_refills_and_resolves_the_move() {
    let mut views = HeadlessViews::new();
    // Bottom row R R Y; the Y swaps with the R above it.
    let mut c = board(&["GBY", "BGR", "RRY"], &mut views);

    assert_eq!(
        c.request_swap(Coord::new(2, 0), Coord::new(2, 1), &mut views),
        Ok(Step::Swap)
    );
    assert_eq!(c.phase(), Phase::Resolving);

    assert_eq!(c.advance(&mut views), Some(Step::Resolve));
    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.grid().to_rows()[2], "...");
    assert_eq!(c.advance(&mut views), Some(Step::Shift));
    assert_eq!(c.grid().to_rows(), vec!["...", "GBY", "BGY"]);
    assert_eq!(c.advance(&mut views), Some(Step::Fill));
    assert!(c.grid().is_full());

    c.run_until_idle(&mut views);
    assert_eq!(c.phase(), Phase::Idle);

    let events = c.take_events();
    assert_eq!(
        events[1],
        CascadeEvent::Matched {
            cells: vec![Coord::new(2, 0), Coord::new(1, 0), Coord::new(0, 0)],
            direction: MatchDirection::Horizontal,
            chain: 0,
        }
    );
    assert!(events.contains(&CascadeEvent::Refilled {
        cells: vec![Coord::new(0, 2), Coord::new(1, 2), Coord::new(2, 2)],
    }));

    let mut counter = Counter::default();
    dispatch(&events, &mut counter);
    assert_eq!(counter.moves, 1);
    assert_eq!(counter.events as usize, events.len());

    assert_eq!(c.stats().moves_resolved, 1);
    assert!(c.stats().items_cleared >= 3);
    // Exploded views were released, refills acquired new ones.
    assert_eq!(views.live(), 9);
}

#[test]
fn non_adjacent_swap_is_rejected_without_touching_the_grid() {
    let mut views = HeadlessViews::new();
    let mut c = board(&["GBY", "BGR", "RRY"], &mut views);
    let before = c.grid().kinds();

    let err = c
        .request_swap(Coord::new(0, 0), Coord::new(2, 2), &mut views)
        .unwrap_err();
    assert!(matches!(err, CoreError::NotAdjacent { .. }));
    assert_eq!(c.grid().kinds(), before);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(c.take_events().is_empty());

    let err = c
        .request_swap(Coord::new(2, 0), Coord::new(3, 0), &mut views)
        .unwrap_err();
    assert_eq!(err, CoreError::OutOfBounds(Coord::new(3, 0)));
    assert_eq!(c.grid().kinds(), before);
}

#[test]
fn five_in_a_row_promotes_a_row_bonus() {
    let mut views = HeadlessViews::new();
    let mut c = board(&["BGYGB", "GYRYG", "RRBRR"], &mut views);

    c.request_swap(Coord::new(2, 0), Coord::new(2, 1), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));
    assert_eq!(c.advance(&mut views), Some(Step::Explode));

    let events = c.take_events();
    let matched = events
        .iter()
        .find_map(|e| match e {
            CascadeEvent::Matched { cells, direction, .. } => Some((cells.len(), *direction)),
            _ => None,
        })
        .unwrap();
    assert_eq!(matched, (5, MatchDirection::Horizontal));
    // The swapped-out cell (2, 1) is not part of the run, so the bonus lands
    // on (2, 0).
    assert!(events.contains(&CascadeEvent::Promoted {
        at: Coord::new(2, 0),
        kind: BonusKind::Row,
    }));
    assert_eq!(c.grid().to_rows()[2], "..-..");
    assert_eq!(c.stats().items_cleared, 5);

    assert_eq!(
        c.grid().kind_at(Coord::new(2, 0)),
        Some(ItemKind::Bonus(BonusKind::Row))
    );

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(views.live(), 15);
}

#[test]
fn row_bonus_clears_its_whole_row() {
    let mut views = HeadlessViews::new();
    let mut c = board(&["GBY", "BYR", "R-G"], &mut views);

    // Swap the bonus up into the middle row.
    c.request_swap(Coord::new(1, 0), Coord::new(1, 1), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::BonusTriggered {
        at: Coord::new(1, 1),
        kind: BonusKind::Row,
        cells: vec![Coord::new(0, 1), Coord::new(1, 1), Coord::new(2, 1)],
    }));
    assert!(!events.iter().any(|e| matches!(e, CascadeEvent::Promoted { .. })));

    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.grid().to_rows(), vec!["GBY", "...", "RYG"]);
    assert_eq!(c.stats().bonuses_triggered, 1);

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(c.stats().moves_resolved, 1);
}

fn coords(list: &[(u8, u8)]) -> Vec<Coord> {
    list.iter().map(|&(x, y)| Coord::new(x, y)).collect()
}

#[test]
fn four_in_a_column_promotes_a_column_bonus() {
    let mut views = HeadlessViews::new();
    // Column 0 reads R R G R bottom-up; the R at (1, 2) swaps into the gap.
    let mut c = board(&["RBGY", "GRYB", "RBGY", "RYBG"], &mut views);

    c.request_swap(Coord::new(1, 2), Coord::new(0, 2), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));
    assert_eq!(c.advance(&mut views), Some(Step::Explode));

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::Matched {
        cells: coords(&[(0, 2), (0, 3), (0, 1), (0, 0)]),
        direction: MatchDirection::Vertical,
        chain: 0,
    }));
    assert!(events.contains(&CascadeEvent::Promoted {
        at: Coord::new(0, 2),
        kind: BonusKind::Column,
    }));
    assert_eq!(c.grid().to_rows(), vec![".BGY", "|GYB", ".BGY", ".YBG"]);

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(views.live(), 16);
}

#[test]
fn crossing_runs_of_six_promote_an_all_clear_bonus() {
    let mut views = HeadlessViews::new();
    // Pulling the R at (1, 0) up to (1, 1) completes a row of four and a
    // column of three that cross there.
    let mut c = board(&["BRYG", "YRBY", "RGRR", "BRYG"], &mut views);

    c.request_swap(Coord::new(1, 0), Coord::new(1, 1), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));
    assert_eq!(c.advance(&mut views), Some(Step::Explode));

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::Matched {
        cells: coords(&[(1, 1), (2, 1), (3, 1), (0, 1), (1, 2), (1, 3)]),
        direction: MatchDirection::All,
        chain: 0,
    }));
    assert!(events.contains(&CascadeEvent::Promoted {
        at: Coord::new(1, 1),
        kind: BonusKind::All,
    }));
    assert_eq!(c.grid().to_rows(), vec!["B.YG", "Y.BY", ".*..", "BGYG"]);
    assert_eq!(c.stats().items_cleared, 6);

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(views.live(), 16);
}

#[test]
fn column_bonus_clears_its_whole_column() {
    let mut views = HeadlessViews::new();
    let mut c = board(&["GBY", "B|R", "RYG"], &mut views);

    // Swap the bonus sideways into column 2.
    c.request_swap(Coord::new(1, 1), Coord::new(2, 1), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::BonusTriggered {
        at: Coord::new(2, 1),
        kind: BonusKind::Column,
        cells: coords(&[(2, 0), (2, 1), (2, 2)]),
    }));
    assert!(!events.iter().any(|e| matches!(e, CascadeEvent::Matched { .. })));

    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.grid().to_rows(), vec!["GB.", "BR.", "RY."]);
    assert_eq!(c.stats().items_cleared, 3);

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(c.stats().moves_resolved, 1);
}

#[test]
fn all_clear_bonus_empties_the_board() {
    let mut views = HeadlessViews::new();
    let mut c = board(&["GBY", "B*R", "RYG"], &mut views);

    c.request_swap(Coord::new(1, 1), Coord::new(1, 2), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));

    let triggered = c
        .take_events()
        .into_iter()
        .find_map(|e| match e {
            CascadeEvent::BonusTriggered { at, kind, cells } => Some((at, kind, cells.len())),
            _ => None,
        })
        .unwrap();
    assert_eq!(triggered, (Coord::new(1, 2), BonusKind::All, 9));

    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.grid().to_rows(), vec!["...", "...", "..."]);
    assert_eq!(c.stats().items_cleared, 9);
    assert_eq!(views.live(), 0);

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(views.live(), 9);
}

#[test]
fn swapping_two_bonuses_fires_both() {
    let mut views = HeadlessViews::new();
    // Row bonus at (1, 2) above a column bonus at (1, 1).
    let mut c = board(&["GBYG", "B-GR", "Y|BY", "GRBY"], &mut views);

    c.request_swap(Coord::new(1, 1), Coord::new(1, 2), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::BonusTriggered {
        at: Coord::new(1, 1),
        kind: BonusKind::Row,
        cells: coords(&[(0, 1), (1, 1), (2, 1), (3, 1)]),
    }));
    assert!(events.contains(&CascadeEvent::BonusTriggered {
        at: Coord::new(1, 2),
        kind: BonusKind::Column,
        cells: coords(&[(1, 0), (1, 1), (1, 2), (1, 3)]),
    }));

    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.grid().to_rows(), vec!["G.YG", "B.GR", "....", "G.BY"]);
    assert_eq!(c.stats().bonuses_triggered, 2);
    assert_eq!(c.stats().items_cleared, 7);
    // Bonus clears never promote.
    assert!(!c
        .take_events()
        .iter()
        .any(|e| matches!(e, CascadeEvent::Promoted { .. })));

    c.run_until_idle(&mut views);
    assert!(c.grid().is_full());
    assert_eq!(views.live(), 16);
}

/// Plays a swap whose collapse drops a G onto a row of G's, returning the
/// events and the cell the chain promoted.
fn chain_reaction(seed: u32) -> (Vec<CascadeEvent>, Coord) {
    let mut views = HeadlessViews::new();
    let grid = Grid::from_rows(&["YBYBY", "BGGYB", "RRGRG"], 3, &mut views).unwrap();
    let mut c = Cascade::from_grid(grid, seed);

    c.request_swap(Coord::new(3, 0), Coord::new(2, 0), &mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Resolve));
    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    assert_eq!(c.advance(&mut views), Some(Step::Shift));
    assert_eq!(c.grid().to_rows(), vec!["...BY", "YBYYB", "BGGGG"]);
    assert_eq!(c.advance(&mut views), Some(Step::Fill));

    // The rescan finds the run the collapse created.
    assert_eq!(c.advance(&mut views), Some(Step::Rescan));
    assert_eq!(c.phase(), Phase::Collapsing);
    assert_eq!(c.chain(), 1);
    assert_eq!(c.advance(&mut views), Some(Step::Explode));
    let bottom = &c.grid().to_rows()[2];
    assert_eq!(bottom.matches('-').count(), 1, "bottom row {bottom}");

    c.run_until_idle(&mut views);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(c.grid().is_full());
    assert_eq!(c.chain(), 0);
    assert_eq!(c.stats().moves_resolved, 1);
    assert_eq!(views.live(), 15);

    let events = c.take_events();
    let at = events
        .iter()
        .find_map(|e| match e {
            CascadeEvent::Promoted { at, kind } => {
                assert_eq!(*kind, BonusKind::Row);
                Some(*at)
            }
            _ => None,
        })
        .unwrap();
    (events, at)
}

#[test]
fn collapse_chains_into_a_rescan_match() {
    let (events, promoted) = chain_reaction(1234);

    let chained = coords(&[(1, 0), (2, 0), (3, 0), (4, 0)]);
    assert!(events.contains(&CascadeEvent::Matched {
        cells: coords(&[(2, 0), (1, 0), (0, 0)]),
        direction: MatchDirection::Horizontal,
        chain: 0,
    }));
    assert!(events.contains(&CascadeEvent::Matched {
        cells: chained.clone(),
        direction: MatchDirection::Horizontal,
        chain: 1,
    }));
    // No swap drives a rescan match, so the bonus lands on a seeded pick.
    assert!(chained.contains(&promoted), "promoted {promoted}");
    assert_eq!(chain_reaction(1234).1, promoted);

    let resolved = events.iter().filter(|e| **e == CascadeEvent::MoveResolved).count();
    assert_eq!(resolved, 1);
}

#[test]
fn stuck_board_is_shuffled_in_place() {
    let mut views = HeadlessViews::new();
    let grid = Grid::from_rows(&["RGB", "GBR", "BRG"], 3, &mut views)
        .unwrap()
        .with_palette(&PALETTE[..3]);
    let mut c = Cascade::from_grid(grid, 5);
    assert!(c.hint().is_empty());
    let codes = |c: &Cascade| {
        let mut v: Vec<u8> = c.grid().kinds().into_iter().flatten().map(ItemKind::code).collect();
        v.sort_unstable();
        v
    };
    let before = codes(&c);

    c.restart(&mut views).unwrap();
    assert_eq!(c.advance(&mut views), Some(Step::Rescan));
    assert_eq!(c.phase(), Phase::Shuffling);
    assert_eq!(c.advance(&mut views), Some(Step::Shuffle));
    assert_eq!(c.phase(), Phase::Rescanning);

    let events = c.take_events();
    assert!(events.contains(&CascadeEvent::NoMoves));
    assert!(events.contains(&CascadeEvent::Shuffled { attempt: 1 }));
    assert!(!events.contains(&CascadeEvent::Regenerated));
    // A permutation: same items, same views.
    assert_eq!(codes(&c), before);
    assert_eq!(views.live(), 9);

    c.run_until_idle(&mut views);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(c.grid().is_full());
    assert!(!c.hint().is_empty());
}

#[test]
fn restart_restores_the_first_fill() {
    let mut views = HeadlessViews::new();
    let mut c = Cascade::new(BoardConfig::default().with_seed(99), &mut views).unwrap();
    let original = c.grid().kinds();
    c.run_until_idle(&mut views);

    for _ in 0..5 {
        let Some(m) = c.finder().find_move(c.grid()) else {
            break;
        };
        c.request_swap(m.from, m.to, &mut views).unwrap();
        c.run_until_idle(&mut views);
    }
    assert!(c.stats().moves_resolved > 0);

    c.restart(&mut views).unwrap();
    assert_eq!(c.phase(), Phase::Rescanning);
    assert_eq!(c.grid().kinds(), original);
    assert_eq!(views.live(), 64);

    c.run_until_idle(&mut views);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn every_hint_is_a_real_move() {
    for seed in [1, 7, 42, 1000, 65535] {
        let mut views = HeadlessViews::new();
        let mut c = Cascade::new(BoardConfig::default().with_seed(seed), &mut views).unwrap();
        c.run_until_idle(&mut views);
        let m = c.finder().find_move(c.grid()).unwrap();
        assert!(c.finder().swap_creates_match(c.grid(), m.from, m.to), "seed {seed}");

        c.request_swap(m.from, m.to, &mut views).unwrap();
        assert_eq!(c.advance(&mut views), Some(Step::Resolve), "seed {seed}");
    }
}
