//! BoardView: maps a `BoardSnapshot` plus session UI state into a canvas.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! The board's `y = 0` row is the bottom of the screen, so rows are flipped
//! when drawn.

use crate::canvas::{Canvas, CellStyle, Rgb};
use crate::core::BoardSnapshot;
use crate::glyphs::{glyph_for, Flash};
use crate::types::{Coord, Phase};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
}

/// Game-state numbers for the side panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HudView {
    pub moves_used: u32,
    pub moves_left: Option<u32>,
    pub cleared: u32,
    pub best_chain: u32,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub snapshot: &'a BoardSnapshot,
    pub cursor: Option<Coord>,
    pub selected: Option<Coord>,
    pub paused: bool,
    pub flash: Option<(Flash, &'a [Coord])>,
    pub hud: Option<HudView>,
    pub adapter: Option<&'a AdapterStatusView>,
}

impl<'a> Frame<'a> {
    pub fn new(snapshot: &'a BoardSnapshot) -> Self {
        Self {
            snapshot,
            cursor: None,
            selected: None,
            paused: false,
            flash: None,
            hud: None,
            adapter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

const BOARD_BG: Rgb = Rgb::new(30, 30, 40);
const CURSOR_BG: Rgb = Rgb::new(70, 70, 95);
const SELECTED_BG: Rgb = Rgb::new(120, 100, 40);
const HINT_BG: Rgb = Rgb::new(40, 80, 55);

pub struct BoardView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for BoardView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
            anchor_y: AnchorY::Center,
        }
    }
}

impl BoardView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Size of the bordered board in terminal cells.
    pub fn frame_size(&self, snap: &BoardSnapshot) -> (u16, u16) {
        (
            snap.width as u16 * self.cell_w + 2,
            snap.height as u16 * self.cell_h + 2,
        )
    }

    /// Top-left terminal cell of the border.
    pub fn origin(&self, snap: &BoardSnapshot, viewport: Viewport) -> (u16, u16) {
        let (frame_w, frame_h) = self.frame_size(snap);
        let x = viewport.width.saturating_sub(frame_w) / 2;
        let y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(frame_h) / 2,
            AnchorY::Top => 0,
        };
        (x, y)
    }

    /// Terminal position of the first column of board cell `c`.
    pub fn screen_pos(&self, snap: &BoardSnapshot, viewport: Viewport, c: Coord) -> Option<(u16, u16)> {
        if c.x >= snap.width || c.y >= snap.height {
            return None;
        }
        let (ox, oy) = self.origin(snap, viewport);
        let row = (snap.height - 1 - c.y) as u16;
        Some((ox + 1 + c.x as u16 * self.cell_w, oy + 1 + row * self.cell_h))
    }

    /// Render into an existing canvas (reused across frames).
    pub fn render_into(&self, frame: &Frame<'_>, viewport: Viewport, canvas: &mut Canvas) {
        canvas.resize(viewport.width, viewport.height);
        canvas.clear(CellStyle::default().cell(' '));

        let snap = frame.snapshot;
        let (frame_w, frame_h) = self.frame_size(snap);
        let (start_x, start_y) = self.origin(snap, viewport);

        let bg = CellStyle::new(Rgb::new(80, 80, 90), BOARD_BG);
        canvas.fill_rect(start_x + 1, start_y + 1, frame_w - 2, frame_h - 2, ' ', bg);
        canvas.draw_box(start_x, start_y, frame_w, frame_h, CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0)));

        for y in 0..snap.height {
            for x in 0..snap.width {
                self.draw_cell(canvas, frame, viewport, Coord::new(x, y));
            }
        }

        self.draw_side_panel(canvas, frame, viewport, start_x + frame_w, start_y);

        if frame.paused {
            self.draw_overlay_text(canvas, start_x, start_y, frame_w, frame_h, "PAUSED");
        } else if snap.phase == Phase::Halted {
            self.draw_overlay_text(canvas, start_x, start_y, frame_w, frame_h, "GAME OVER");
        }
    }

    /// Convenience helper that allocates a new canvas.
    pub fn render(&self, frame: &Frame<'_>, viewport: Viewport) -> Canvas {
        let mut canvas = Canvas::new(viewport.width, viewport.height);
        self.render_into(frame, viewport, &mut canvas);
        canvas
    }

    fn draw_cell(&self, canvas: &mut Canvas, frame: &Frame<'_>, viewport: Viewport, c: Coord) {
        let snap = frame.snapshot;
        let Some((px, py)) = self.screen_pos(snap, viewport, c) else {
            return;
        };

        let mut bg = BOARD_BG;
        if snap.hint.contains(&c) {
            bg = HINT_BG;
        }
        if frame.selected == Some(c) {
            bg = SELECTED_BG;
        }
        if frame.cursor == Some(c) {
            bg = CURSOR_BG;
        }

        let flash = frame
            .flash
            .and_then(|(kind, cells)| cells.contains(&c).then_some(kind));

        let (ch, mut style) = match (snap.kind_at(c), flash) {
            (_, Some(Flash::Explode)) => ('✶', CellStyle::new(Rgb::new(255, 255, 255), bg).bold()),
            (Some(kind), flash) => {
                let glyph = glyph_for(kind);
                let style = CellStyle::new(glyph.color, bg);
                (glyph.ch, if flash == Some(Flash::Land) { style.bold() } else { style })
            }
            (None, _) => ('·', CellStyle::new(Rgb::new(90, 90, 100), bg).dim()),
        };
        if kind_is_bonus(snap, c) {
            style = style.bold();
        }

        canvas.fill_rect(px, py, self.cell_w, self.cell_h, ' ', CellStyle::new(style.fg, bg));
        canvas.put_char(px, py, ch, style);
    }

    fn draw_side_panel(&self, canvas: &mut Canvas, frame: &Frame<'_>, viewport: Viewport, right_x: u16, start_y: u16) {
        let panel_x = right_x.saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }
        let label = CellStyle::new(Rgb::new(220, 220, 220), Rgb::new(0, 0, 0)).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let snap = frame.snapshot;
        let hud = frame.hud.unwrap_or(HudView {
            moves_used: snap.moves_resolved,
            ..HudView::default()
        });

        let mut y = start_y;
        canvas.put_str(panel_x, y, "MOVES", label);
        y += 1;
        let end = canvas.put_u32(panel_x, y, hud.moves_used, value);
        if let Some(left) = hud.moves_left {
            let end = canvas.put_str(end, y, " / ", value.dim());
            canvas.put_u32(end, y, hud.moves_used + left, value.dim());
        }
        y += 2;

        canvas.put_str(panel_x, y, "CLEARED", label);
        y += 1;
        canvas.put_u32(panel_x, y, hud.cleared.max(snap.items_cleared), value);
        y += 2;

        canvas.put_str(panel_x, y, "CHAIN", label);
        y += 1;
        let end = canvas.put_u32(panel_x, y, snap.chain, value);
        if hud.best_chain > 0 {
            let end = canvas.put_str(end, y, " best ", value.dim());
            canvas.put_u32(end, y, hud.best_chain, value.dim());
        }
        y += 2;

        canvas.put_str(panel_x, y, "PHASE", label);
        y += 1;
        canvas.put_str(panel_x, y, snap.phase.as_str(), value);
        y += 2;

        canvas.put_str(panel_x, y, "AI", label);
        y += 1;
        match frame.adapter {
            Some(st) if st.enabled => {
                let end = canvas.put_str(panel_x, y, "ON ", value);
                let end = canvas.put_u32(end, y, st.client_count as u32, value);
                canvas.put_str(end, y, " clients", value.dim());
                y += 1;
                let end = canvas.put_str(panel_x, y, "CTRL ", value);
                match st.controller_id {
                    Some(id) => canvas.put_u32(end, y, id as u32, value),
                    None => canvas.put_str(end, y, "-", value),
                };
            }
            _ => {
                canvas.put_str(panel_x, y, "OFF", value);
            }
        }
        y += 2;

        if y < viewport.height {
            canvas.put_str(panel_x, y, "space swap  ? hint", value.dim());
        }
        if y + 1 < viewport.height {
            canvas.put_str(panel_x, y + 1, "r restart  p pause", value.dim());
        }
    }

    fn draw_overlay_text(&self, canvas: &mut Canvas, start_x: u16, start_y: u16, frame_w: u16, frame_h: u16, text: &str) {
        let mid_y = start_y.saturating_add(frame_h / 2);
        let text_w = text.chars().count() as u16;
        let x = start_x.saturating_add(frame_w.saturating_sub(text_w) / 2);
        let style = CellStyle::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)).bold();
        canvas.put_str(x, mid_y, text, style);
    }
}

fn kind_is_bonus(snap: &BoardSnapshot, c: Coord) -> bool {
    matches!(snap.kind_at(c), Some(k) if k.is_bonus())
}
