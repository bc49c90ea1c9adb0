//! Terminal match-3 runner (default binary).
//!
//! Crossterm for input, the canvas-based renderer for output, and an
//! optional TCP adapter for remote control.
//!
//! Every flag can also be set through its `MATCH3_*` environment variable;
//! a flag on the command line wins over the environment.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};

use tui_match3::adapter::{Adapter, Journal, LogEvent, LogLevel};
use tui_match3::core::{BoardConfig, BoardSnapshot, GameObserver};
use tui_match3::engine::{MoveLimit, Session};
use tui_match3::input::{handle_key_event, should_quit};
use tui_match3::term::{
    AdapterStatusView, BoardView, Canvas, Frame, GlyphPool, HudView, TerminalRenderer, Viewport,
};
use tui_match3::types::{CascadeEvent, TICK_MS};

/// Terminal match-3 puzzle.
#[derive(Debug, Parser)]
#[command(
    name = "tui-match3",
    version,
    about = "Terminal match-3 puzzle with a deterministic cascade engine and AI control over TCP."
)]
struct Args {
    /// Board width in cells.
    #[arg(long, env = "MATCH3_BOARD_WIDTH")]
    width: Option<u8>,

    /// Board height in cells.
    #[arg(long, env = "MATCH3_BOARD_HEIGHT")]
    height: Option<u8>,

    /// Shortest run that counts as a match.
    #[arg(long, env = "MATCH3_MIN_MATCH")]
    min_match: Option<u8>,

    /// Idle seconds before the hint is shown.
    #[arg(long, env = "MATCH3_HINT_DELAY")]
    hint_delay: Option<f32>,

    /// Number of colours in play (3-7).
    #[arg(long, env = "MATCH3_TAGS")]
    tags: Option<u8>,

    /// RNG seed; the same seed replays the same game.
    #[arg(long, env = "MATCH3_SEED")]
    seed: Option<u32>,

    /// Move budget. Unlimited when not set.
    #[arg(long, env = "MATCH3_MOVES")]
    moves: Option<u32>,
}

impl Args {
    /// Layer the flags over `base` and validate the result.
    fn board_config(&self, mut base: BoardConfig) -> Result<BoardConfig> {
        if let Some(width) = self.width {
            base.board_width = width;
        }
        if let Some(height) = self.height {
            base.board_height = height;
        }
        if let Some(min_match) = self.min_match {
            base.min_match_length = min_match;
        }
        if let Some(hint_delay) = self.hint_delay {
            base.hint_delay_seconds = hint_delay;
        }
        if let Some(tags) = self.tags {
            base.tag_count = tags;
        }
        if let Some(seed) = self.seed {
            base.seed = seed;
        }
        base.validate().context("invalid board configuration")?;
        Ok(base)
    }
}

/// Fans session events out to the move counter and the journal.
struct Observers<'a> {
    limit: &'a mut MoveLimit,
    journal: &'a mut Journal,
}

impl GameObserver for Observers<'_> {
    fn on_move_resolved(&mut self) {
        self.limit.on_move_resolved();
        self.journal.on_move_resolved();
    }

    fn on_no_moves(&mut self) {
        self.limit.on_no_moves();
        self.journal.on_no_moves();
    }

    fn on_event(&mut self, event: &CascadeEvent) {
        self.limit.on_event(event);
        self.journal.on_event(event);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.board_config(BoardConfig::from_env())?;
    let mut journal = Journal::from_env().context("opening journal")?;
    let mut adapter = Adapter::start_from_env().context("starting adapter")?;

    let session = Session::new(config.clone(), GlyphPool::new())?;
    journal.log(
        LogEvent::new(LogLevel::Info, "session", "start")
            .field("width", config.board_width)
            .field("height", config.board_height)
            .field("seed", config.seed)
            .field("adapter", adapter.is_some()),
    );

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, session, args.moves, &mut journal, adapter.as_mut());

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(
    term: &mut TerminalRenderer,
    mut session: Session<GlyphPool>,
    moves: Option<u32>,
    journal: &mut Journal,
    mut adapter: Option<&mut Adapter>,
) -> Result<()> {
    let view = BoardView::default();
    let mut canvas = Canvas::new(0, 0);
    let mut snapshot = BoardSnapshot::default();
    let mut limit = MoveLimit::new(moves);

    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        session.snapshot_into(&mut snapshot);
        let status = adapter.as_deref().map(|a| AdapterStatusView {
            enabled: true,
            client_count: a.status().client_count().min(u16::MAX as usize) as u16,
            controller_id: a.status().controller_id(),
        });
        let frame = Frame {
            snapshot: &snapshot,
            cursor: Some(session.cursor()),
            selected: session.selected(),
            paused: session.paused(),
            flash: session.views().flash(),
            hud: Some(HudView {
                moves_used: limit.used(),
                moves_left: limit.remaining(),
                cleared: limit.cleared(),
                best_chain: limit.best_chain(),
            }),
            adapter: status.as_ref(),
        };
        view.render_into(&frame, Viewport::new(w, h), &mut canvas);
        term.present(&mut canvas)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        journal.info("session", "quit");
                        return Ok(());
                    }
                    if let Some(action) = handle_key_event(key) {
                        if let Err(e) = session.apply_action(action) {
                            journal.log(
                                LogEvent::new(LogLevel::Debug, "input", "action rejected")
                                    .field("action", action.as_str())
                                    .field("error", e.code()),
                            );
                        }
                    }
                }
                Event::Resize(_, _) => term.invalidate(),
                _ => {}
            }
        }

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();

            if let Some(a) = adapter.as_deref_mut() {
                a.process_commands(&mut session, limit.remaining());
            }

            let events = {
                let mut observers = Observers {
                    limit: &mut limit,
                    journal: &mut *journal,
                };
                session.tick(TICK_MS, &mut observers)
            };
            session.views_mut().tick(TICK_MS);

            if limit.exhausted() && !session.is_game_over() {
                session.game_over();
            }

            if let Some(a) = adapter.as_deref_mut() {
                a.publish_events(session.episode_id(), &events);
                a.publish_observation(&session, limit.remaining());
            }
        }
    }
}
