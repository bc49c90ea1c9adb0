//! Key mapping from terminal events to game actions.

use crate::types::{Direction, GameAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map keyboard input to game actions.
///
/// Arrows, `hjkl` and `wasd` move the cursor. Holding shift (or typing the
/// capital letter) swaps the cursor item in that direction instead.
pub fn handle_key_event(key: KeyEvent) -> Option<GameAction> {
    if let Some((dir, shifted)) = direction_key(key) {
        return Some(if shifted {
            GameAction::Swap(dir)
        } else {
            match dir {
                Direction::Up => GameAction::CursorUp,
                Direction::Down => GameAction::CursorDown,
                Direction::Left => GameAction::CursorLeft,
                Direction::Right => GameAction::CursorRight,
            }
        });
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(GameAction::Select),
        KeyCode::Char('?') => Some(GameAction::Hint),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(GameAction::Pause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(GameAction::Restart),
        _ => None,
    }
}

/// Direction keys and whether they were shifted.
fn direction_key(key: KeyEvent) -> Option<(Direction, bool)> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Up => Some((Direction::Up, shift)),
        KeyCode::Down => Some((Direction::Down, shift)),
        KeyCode::Left => Some((Direction::Left, shift)),
        KeyCode::Right => Some((Direction::Right, shift)),
        KeyCode::Char(c) => {
            let dir = match c.to_ascii_lowercase() {
                'k' | 'w' => Direction::Up,
                'j' | 's' => Direction::Down,
                'h' | 'a' => Direction::Left,
                'l' | 'd' => Direction::Right,
                _ => return None,
            };
            Some((dir, shift || c.is_ascii_uppercase()))
        }
        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
