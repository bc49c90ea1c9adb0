use tui_match3::core::{BoardSnapshot, Cascade, Grid, HeadlessViews};
use tui_match3::term::{glyph_for, AdapterStatusView, AnchorY, BoardView, Frame, HudView, Viewport};
use tui_match3::types::{BonusKind, Coord, ItemKind, Tag};

fn snapshot(rows: &[&str]) -> (Cascade, HeadlessViews) {
    let mut views = HeadlessViews::new();
    let grid = Grid::from_rows(rows, 3, &mut views).unwrap();
    (Cascade::from_grid(grid, 1), views)
}

fn snap_of(rows: &[&str]) -> BoardSnapshot {
    snapshot(rows).0.snapshot()
}

#[test]
fn test_border_wraps_the_board_exactly() {
    let snap = snap_of(&["GBY", "BGR", "RRY"]);
    let view = BoardView::default();
    assert_eq!(view.frame_size(&snap), (8, 5));

    let canvas = view.render(&Frame::new(&snap), Viewport::new(8, 5));
    let ch = |x, y| canvas.get(x, y).map(|c| c.ch);
    assert_eq!(ch(0, 0), Some('┌'));
    assert_eq!(ch(7, 0), Some('┐'));
    assert_eq!(ch(0, 4), Some('└'));
    assert_eq!(ch(7, 4), Some('┘'));
    assert_eq!(ch(0, 2), Some('│'));
}

#[test]
fn test_bottom_row_is_drawn_last() {
    let snap = snap_of(&["GBY", "BGR", "R-Y"]);
    let view = BoardView::default();
    let vp = Viewport::new(8, 5);
    let canvas = view.render(&Frame::new(&snap), vp);

    assert_eq!(view.screen_pos(&snap, vp, Coord::new(0, 0)), Some((1, 3)));
    assert_eq!(view.screen_pos(&snap, vp, Coord::new(2, 2)), Some((5, 1)));
    assert_eq!(view.screen_pos(&snap, vp, Coord::new(3, 0)), None);

    let bonus = canvas.get(3, 3).unwrap();
    assert_eq!(bonus.ch, glyph_for(ItemKind::Bonus(BonusKind::Row)).ch);
    assert!(bonus.style.bold);

    let top_left = canvas.get(1, 1).unwrap();
    let green = glyph_for(ItemKind::Plain(Tag::Green));
    assert_eq!((top_left.ch, top_left.style.fg), (green.ch, green.color));
}

#[test]
fn test_cursor_and_selection_change_background() {
    let snap = snap_of(&["GBY", "BGR", "RRY"]);
    let view = BoardView::default();
    let vp = Viewport::new(8, 5);

    let plain = view.render(&Frame::new(&snap), vp);
    let mut frame = Frame::new(&snap);
    frame.cursor = Some(Coord::new(1, 1));
    frame.selected = Some(Coord::new(2, 1));
    let marked = view.render(&frame, vp);

    let bg = |canvas: &tui_match3::term::Canvas, x, y| canvas.get(x, y).unwrap().style.bg;
    assert_ne!(bg(&plain, 3, 2), bg(&marked, 3, 2));
    assert_ne!(bg(&plain, 5, 2), bg(&marked, 5, 2));
    assert_ne!(bg(&marked, 3, 2), bg(&marked, 5, 2));
    assert_eq!(bg(&plain, 1, 1), bg(&marked, 1, 1));
}

#[test]
fn test_side_panel_shows_moves_and_adapter() {
    let snap = snap_of(&["GBY", "BGR", "RRY"]);
    let view = BoardView::default().with_anchor_y(AnchorY::Top);
    let status = AdapterStatusView {
        enabled: true,
        client_count: 2,
        controller_id: Some(1),
    };
    let mut frame = Frame::new(&snap);
    frame.hud = Some(HudView {
        moves_used: 2,
        moves_left: Some(3),
        cleared: 12,
        best_chain: 4,
    });
    frame.adapter = Some(&status);

    let canvas = view.render(&frame, Viewport::new(40, 20));
    let text: Vec<String> = (0..20).map(|y| canvas.row_text(y)).collect();

    assert!(text[0].contains("MOVES"));
    assert!(text[1].contains("2 / 5"));
    assert!(text[4].contains("12"));
    assert!(text[7].contains("0 best 4"));
    assert!(text[10].contains("idle"));
    assert!(text[13].contains("ON 2 clients"));
    assert!(text[14].contains("CTRL 1"));
    assert!(text.iter().any(|row| row.contains("? hint")));
}

#[test]
fn test_narrow_viewport_hides_side_panel() {
    let snap = snap_of(&["GBY", "BGR", "RRY"]);
    let canvas = BoardView::default().render(&Frame::new(&snap), Viewport::new(16, 5));
    assert!((0..5).all(|y| !canvas.row_text(y).contains("MOVES")));
}

#[test]
fn test_pause_and_game_over_overlays() {
    let (mut cascade, mut views) = snapshot(&["GBY", "BGR", "RRY"]);
    let view = BoardView::default();
    let vp = Viewport::new(40, 20);

    let snap = cascade.snapshot();
    let mut frame = Frame::new(&snap);
    frame.paused = true;
    let canvas = view.render(&frame, vp);
    assert!(canvas.row_text(9).contains("PAUSED"));

    cascade.halt(&mut views);
    let halted = cascade.snapshot();
    let canvas = view.render(&Frame::new(&halted), vp);
    assert!(canvas.row_text(9).contains("GAME OVER"));
    assert!(!canvas.row_text(9).contains("PAUSED"));
}
