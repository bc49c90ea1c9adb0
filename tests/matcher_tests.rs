//! Run detection, match shape and move lookahead

use tui_match3::core::matcher::bonus_area;
use tui_match3::core::{Grid, HeadlessViews, MatchFinder};
use tui_match3::types::{BonusKind, Coord, MatchDirection};

fn grid(rows: &[&str]) -> Grid {
    Grid::from_rows(rows, 3, &mut HeadlessViews::new()).unwrap()
}

fn coords(list: &[(u8, u8)]) -> Vec<Coord> {
    list.iter().map(|&(x, y)| Coord::new(x, y)).collect()
}

#[test]
fn test_runs_start_at_the_seed() {
    let g = grid(&["GRB", "YRB", "RRR"]);
    let finder = MatchFinder::new(3);

    let h = finder.horizontal_run(&g, Coord::new(1, 0));
    assert_eq!(h, coords(&[(1, 0), (2, 0), (0, 0)]));

    let v = finder.vertical_run(&g, Coord::new(1, 0));
    assert_eq!(v, coords(&[(1, 0), (1, 1), (1, 2)]));

    // The seed alone when nothing around it matches.
    assert_eq!(finder.horizontal_run(&g, Coord::new(0, 2)), coords(&[(0, 2)]));
}

#[test]
fn test_matches_at_merges_both_axes() {
    let g = grid(&["GRB", "YRB", "RRR"]);
    let finder = MatchFinder::new(3);
    let cells = finder.matches_at(&g, Coord::new(1, 0));
    assert_eq!(cells.len(), 5);
    assert_eq!(cells[0], Coord::new(1, 0));
    assert_eq!(finder.classify_direction(&cells), MatchDirection::None);

    assert!(finder.matches_at(&g, Coord::new(2, 2)).is_empty());
}

#[test]
fn test_classify_direction() {
    let finder = MatchFinder::new(3);

    let column = coords(&[(2, 0), (2, 1), (2, 2), (2, 3)]);
    assert_eq!(finder.classify_direction(&column), MatchDirection::Vertical);

    let row = coords(&[(0, 4), (1, 4), (2, 4)]);
    assert_eq!(finder.classify_direction(&row), MatchDirection::Horizontal);

    let ell = coords(&[(0, 0), (1, 0), (2, 0), (0, 1), (0, 2), (0, 3)]);
    assert_eq!(finder.classify_direction(&ell), MatchDirection::All);

    // Mixed shapes of five or fewer are not bonus material.
    let tee = coords(&[(0, 0), (1, 0), (2, 0), (1, 1), (1, 2)]);
    assert_eq!(finder.classify_direction(&tee), MatchDirection::None);

    assert_eq!(finder.classify_direction(&row[..2]), MatchDirection::None);
    assert_eq!(finder.classify_direction(&[]), MatchDirection::None);
}

#[test]
fn test_bonus_items_break_runs() {
    let g = grid(&["GBY", "BGY", "RR-"]);
    let finder = MatchFinder::new(3);
    assert_eq!(finder.horizontal_run(&g, Coord::new(0, 0)).len(), 2);
    assert!(finder.first_match(&g).is_empty());
}

#[test]
fn test_first_match_scans_bottom_row_first() {
    let g = grid(&["BBB", "GYR", "RRY"]);
    let finder = MatchFinder::new(3);
    assert_eq!(finder.first_match(&g), coords(&[(0, 2), (1, 2), (2, 2)]));
}

#[test]
fn test_find_move_line_and_gap_patterns() {
    let finder = MatchFinder::new(3);

    // R R Y along the bottom with an R above the Y.
    let line = grid(&["GBY", "BGR", "RRY"]);
    let m = finder.find_move(&line).unwrap();
    assert_eq!((m.from, m.to), (Coord::new(2, 1), Coord::new(2, 0)));
    assert!(finder.swap_creates_match(&line, m.from, m.to));
    assert_eq!(m.cells.as_slice(), coords(&[(0, 0), (1, 0), (2, 1)]).as_slice());

    // R . R with an R below the gap.
    let gap = grid(&["RGR", "BRY", "GBY"]);
    let m = finder.find_move(&gap).unwrap();
    assert!(finder.swap_creates_match(&gap, m.from, m.to));
    assert!(!finder.potential_moves(&gap).is_empty());

    // A stuck board.
    let stuck = grid(&["RGB", "GBR", "BRG"]);
    assert!(finder.find_move(&stuck).is_none());
    assert!(finder.potential_moves(&stuck).is_empty());
}

#[test]
fn test_longer_minimum_uses_exhaustive_search() {
    let finder = MatchFinder::new(4);
    let g = Grid::from_rows(&["GBYP", "BYGB", "YGRB", "RRBR"], 4, &mut HeadlessViews::new()).unwrap();
    let m = finder.find_move(&g).unwrap();
    assert_eq!((m.from, m.to), (Coord::new(2, 0), Coord::new(2, 1)));
    assert!(finder.swap_creates_match(&g, m.from, m.to));
}

#[test]
fn test_filter_bonus_compatible_drops_misaligned_bonus() {
    let g = grid(&["GBY", "BG|", "RR-"]);
    let finder = MatchFinder::new(3);
    let row = coords(&[(0, 0), (1, 0), (2, 0)]);
    assert_eq!(finder.filter_bonus_compatible(&g, &row), row);

    let with_column = coords(&[(0, 1), (1, 1), (2, 1)]);
    assert_eq!(
        finder.filter_bonus_compatible(&g, &with_column),
        coords(&[(0, 1), (1, 1)])
    );
}

#[test]
fn test_bonus_area_shapes() {
    let g = grid(&["GBYR", "BGYR", "RRYG"]);
    assert_eq!(
        bonus_area(&g, Coord::new(1, 1), BonusKind::Row),
        coords(&[(0, 1), (1, 1), (2, 1), (3, 1)])
    );
    assert_eq!(
        bonus_area(&g, Coord::new(1, 1), BonusKind::Column),
        coords(&[(1, 0), (1, 1), (1, 2)])
    );
    assert_eq!(bonus_area(&g, Coord::new(1, 1), BonusKind::All).len(), 12);
}
