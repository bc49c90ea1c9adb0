//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (rule engine, terminal rendering, AI protocol).
//!
//! # Coordinates
//!
//! Cells are addressed by `(x, y)` with `x` growing to the right and `y`
//! growing **upwards**: `y = 0` is the bottom row and gravity pulls items
//! towards it. Renderers flip rows when drawing.
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds. The rule engine itself never waits;
//! these are the settle delays a driver observes between phase boundaries
//! so presentation has time to animate.
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `SWAP_SETTLE_MS` | 300 | Swap (and swap-back) animation |
//! | `EXPLODE_SETTLE_MS` | 100 | Explosion of matched items |
//! | `SHIFT_SETTLE_MS` | 200 | Items falling into gaps |
//! | `FILL_SETTLE_MS` | 200 | New items appearing |
//! | `SHUFFLE_SETTLE_MS` | 300 | Items moving to shuffled cells |
//!
//! # Examples
//!
//! ```
//! use tui_match3_types::{same_type, BonusKind, GameAction, ItemKind, Tag};
//!
//! let red = ItemKind::Plain(Tag::Red);
//! assert!(same_type(red, ItemKind::Plain(Tag::Red)));
//! assert!(!same_type(red, ItemKind::Plain(Tag::Blue)));
//!
//! // Bonus items never match by type, not even with themselves.
//! let row = ItemKind::Bonus(BonusKind::Row);
//! assert!(!same_type(row, row));
//!
//! assert_eq!(GameAction::from_str("swapLeft"), Some(GameAction::Swap(tui_match3_types::Direction::Left)));
//! ```

/// Default board width in cells
pub const DEFAULT_BOARD_WIDTH: u8 = 8;

/// Default board height in cells
pub const DEFAULT_BOARD_HEIGHT: u8 = 8;

/// Largest supported board side
pub const MAX_BOARD_DIM: u8 = 32;

/// Default minimum run length that counts as a match
pub const DEFAULT_MIN_MATCH: u8 = 3;

/// A merged match longer than this (and neither a pure row nor column) promotes an all-clear bonus
pub const ALL_BONUS_THRESHOLD: usize = 5;

/// Default delay before a hint is surfaced (seconds)
pub const DEFAULT_HINT_DELAY_SECS: f32 = 5.0;

/// Default consecutive shuffles before the board is regenerated
pub const DEFAULT_MAX_SHUFFLES: u32 = 8;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Swap and swap-back animation
pub const SWAP_SETTLE_MS: u32 = 300;

/// Explosion animation
pub const EXPLODE_SETTLE_MS: u32 = 100;

/// Gravity animation after an explosion
pub const SHIFT_SETTLE_MS: u32 = 200;

/// Refill animation
pub const FILL_SETTLE_MS: u32 = 200;

/// Shuffle animation
pub const SHUFFLE_SETTLE_MS: u32 = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_timing_defaults() {
        assert_eq!(SWAP_SETTLE_MS, 300);
        assert_eq!(EXPLODE_SETTLE_MS, 100);
        assert_eq!(SHIFT_SETTLE_MS, 200);
        assert_eq!(FILL_SETTLE_MS, 200);
        assert_eq!(SHUFFLE_SETTLE_MS, 300);

        assert_eq!(Step::Swap.settle_ms(), SWAP_SETTLE_MS);
        assert_eq!(Step::Resolve.settle_ms(), 0);
        assert_eq!(Step::Rescan.settle_ms(), 0);
    }

    #[test]
    fn direction_opposites_are_involutive() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn coord_step_stops_at_zero() {
        let origin = Coord::new(0, 0);
        assert_eq!(origin.step(Direction::Left), None);
        assert_eq!(origin.step(Direction::Down), None);
        assert_eq!(origin.step(Direction::Up), Some(Coord::new(0, 1)));
        assert_eq!(origin.step(Direction::Right), Some(Coord::new(1, 0)));
    }

    #[test]
    fn item_kind_codes_are_unique() {
        let mut seen = Vec::new();
        for tag in Tag::ALL {
            seen.push(ItemKind::Plain(tag).code());
        }
        for bonus in [BonusKind::Row, BonusKind::Column, BonusKind::All] {
            seen.push(ItemKind::Bonus(bonus).code());
        }
        let mut dedup = seen.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(seen.len(), dedup.len());
        assert!(!seen.contains(&EMPTY_CODE));

        for code in seen {
            assert_eq!(ItemKind::from_code(code).map(ItemKind::code), Some(code));
        }
    }

    #[test]
    fn item_kind_chars_parse_back() {
        for tag in Tag::ALL {
            let kind = ItemKind::Plain(tag);
            assert_eq!(ItemKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(ItemKind::from_char('-'), Some(ItemKind::Bonus(BonusKind::Row)));
        assert_eq!(ItemKind::from_char('|'), Some(ItemKind::Bonus(BonusKind::Column)));
        assert_eq!(ItemKind::from_char('*'), Some(ItemKind::Bonus(BonusKind::All)));
        assert_eq!(ItemKind::from_char('?'), None);
    }

    #[test]
    fn match_direction_maps_to_bonus() {
        assert_eq!(MatchDirection::Horizontal.bonus_kind(), Some(BonusKind::Row));
        assert_eq!(MatchDirection::Vertical.bonus_kind(), Some(BonusKind::Column));
        assert_eq!(MatchDirection::All.bonus_kind(), Some(BonusKind::All));
        assert_eq!(MatchDirection::None.bonus_kind(), None);
    }

    #[test]
    fn busy_phases_hold_the_grid() {
        assert!(!Phase::Idle.is_busy());
        assert!(!Phase::AwaitingSwap.is_busy());
        assert!(!Phase::Halted.is_busy());
        assert!(!Phase::Halted.accepts_swap());
        assert!(Phase::AwaitingSwap.accepts_swap());
        assert!(Phase::Resolving.is_busy());
        assert!(Phase::Shuffling.is_busy());
    }

    #[test]
    fn game_action_round_trips_through_names() {
        let actions = [
            GameAction::CursorUp,
            GameAction::CursorDown,
            GameAction::CursorLeft,
            GameAction::CursorRight,
            GameAction::Select,
            GameAction::Swap(Direction::Up),
            GameAction::Swap(Direction::Right),
            GameAction::Swap(Direction::Down),
            GameAction::Swap(Direction::Left),
            GameAction::Restart,
            GameAction::Hint,
            GameAction::Pause,
        ];
        for action in actions {
            assert_eq!(GameAction::from_str(action.as_str()), Some(action));
        }
    }
}

/// Board coordinate. `y = 0` is the bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Step one cell in `dir`.
    ///
    /// Only the lower bounds are checked here; the grid rejects coordinates
    /// past its width/height.
    pub fn step(self, dir: Direction) -> Option<Coord> {
        match dir {
            Direction::Up => self.y.checked_add(1).map(|y| Coord::new(self.x, y)),
            Direction::Right => self.x.checked_add(1).map(|x| Coord::new(x, self.y)),
            Direction::Down => self.y.checked_sub(1).map(|y| Coord::new(self.x, y)),
            Direction::Left => self.x.checked_sub(1).map(|x| Coord::new(x, self.y)),
        }
    }

    /// Whether `other` is one orthogonal step away.
    pub fn is_adjacent(self, other: Coord) -> bool {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx + dy == 1
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four neighbour directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Neighbour probing order: up, right, down, left.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Parse direction from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "right" | "r" => Some(Direction::Right),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

/// Colour tag carried by a plain item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

/// Backing storage for palettes; boards borrow a prefix of it.
pub static PALETTE: [Tag; 7] = Tag::ALL;

impl Tag {
    /// Full palette, in code order.
    pub const ALL: [Tag; 7] = [
        Tag::Red,
        Tag::Orange,
        Tag::Yellow,
        Tag::Green,
        Tag::Blue,
        Tag::Purple,
        Tag::Pink,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Parse tag from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_match3_types::Tag;
    ///
    /// assert_eq!(Tag::from_str("red"), Some(Tag::Red));
    /// assert_eq!(Tag::from_str("PINK"), Some(Tag::Pink));
    /// assert_eq!(Tag::from_str("teal"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(Tag::Red),
            "orange" => Some(Tag::Orange),
            "yellow" => Some(Tag::Yellow),
            "green" => Some(Tag::Green),
            "blue" => Some(Tag::Blue),
            "purple" => Some(Tag::Purple),
            "pink" => Some(Tag::Pink),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Red => "red",
            Tag::Orange => "orange",
            Tag::Yellow => "yellow",
            Tag::Green => "green",
            Tag::Blue => "blue",
            Tag::Purple => "purple",
            Tag::Pink => "pink",
        }
    }
}

/// Effect of a bonus item when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BonusKind {
    /// Clears the whole row
    Row,
    /// Clears the whole column
    Column,
    /// Clears the whole grid
    All,
}

impl BonusKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "row" => Some(BonusKind::Row),
            "column" | "col" => Some(BonusKind::Column),
            "all" => Some(BonusKind::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BonusKind::Row => "row",
            BonusKind::Column => "column",
            BonusKind::All => "all",
        }
    }
}

/// Item variant: a plain coloured tile or a promoted bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Plain(Tag),
    Bonus(BonusKind),
}

/// Snapshot/wire code of an empty cell.
pub const EMPTY_CODE: u8 = 0;

impl ItemKind {
    pub fn is_bonus(&self) -> bool {
        matches!(self, ItemKind::Bonus(_))
    }

    pub fn tag(&self) -> Option<Tag> {
        match self {
            ItemKind::Plain(tag) => Some(*tag),
            ItemKind::Bonus(_) => None,
        }
    }

    /// Compact code used by snapshots and the wire protocol.
    ///
    /// `1..=7` are tags in palette order, `8` row bonus, `9` column bonus,
    /// `10` all-clear bonus. `0` is reserved for empty cells.
    pub fn code(self) -> u8 {
        match self {
            ItemKind::Plain(tag) => tag.index() as u8 + 1,
            ItemKind::Bonus(BonusKind::Row) => 8,
            ItemKind::Bonus(BonusKind::Column) => 9,
            ItemKind::Bonus(BonusKind::All) => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=7 => Tag::from_index(code as usize - 1).map(ItemKind::Plain),
            8 => Some(ItemKind::Bonus(BonusKind::Row)),
            9 => Some(ItemKind::Bonus(BonusKind::Column)),
            10 => Some(ItemKind::Bonus(BonusKind::All)),
            _ => None,
        }
    }

    /// Single-character form used in board pictures.
    pub fn as_char(self) -> char {
        match self {
            ItemKind::Plain(Tag::Red) => 'R',
            ItemKind::Plain(Tag::Orange) => 'O',
            ItemKind::Plain(Tag::Yellow) => 'Y',
            ItemKind::Plain(Tag::Green) => 'G',
            ItemKind::Plain(Tag::Blue) => 'B',
            ItemKind::Plain(Tag::Purple) => 'P',
            ItemKind::Plain(Tag::Pink) => 'K',
            ItemKind::Bonus(BonusKind::Row) => '-',
            ItemKind::Bonus(BonusKind::Column) => '|',
            ItemKind::Bonus(BonusKind::All) => '*',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'R' => Some(ItemKind::Plain(Tag::Red)),
            'O' => Some(ItemKind::Plain(Tag::Orange)),
            'Y' => Some(ItemKind::Plain(Tag::Yellow)),
            'G' => Some(ItemKind::Plain(Tag::Green)),
            'B' => Some(ItemKind::Plain(Tag::Blue)),
            'P' => Some(ItemKind::Plain(Tag::Purple)),
            'K' => Some(ItemKind::Plain(Tag::Pink)),
            '-' => Some(ItemKind::Bonus(BonusKind::Row)),
            '|' => Some(ItemKind::Bonus(BonusKind::Column)),
            '*' => Some(ItemKind::Bonus(BonusKind::All)),
            _ => None,
        }
    }
}

/// Same-type comparison used by run detection.
///
/// Two plain items match iff their tags are equal. A bonus item never
/// matches anything by type, including another bonus of the same kind, so
/// bonuses can never be part of a run.
pub fn same_type(a: ItemKind, b: ItemKind) -> bool {
    match (a, b) {
        (ItemKind::Plain(x), ItemKind::Plain(y)) => x == y,
        _ => false,
    }
}

/// Monotonic item identity, stable while the item moves between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

/// Opaque presentation handle handed out by a view pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);

/// A logical item. The owning cell is found through the grid, not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
}

/// Shape classification of a resolved match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchDirection {
    None,
    Horizontal,
    Vertical,
    All,
}

impl MatchDirection {
    /// Bonus promoted from a match of this shape.
    pub fn bonus_kind(self) -> Option<BonusKind> {
        match self {
            MatchDirection::None => None,
            MatchDirection::Horizontal => Some(BonusKind::Row),
            MatchDirection::Vertical => Some(BonusKind::Column),
            MatchDirection::All => Some(BonusKind::All),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchDirection::None => "none",
            MatchDirection::Horizontal => "horizontal",
            MatchDirection::Vertical => "vertical",
            MatchDirection::All => "all",
        }
    }
}

/// Cascade pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    AwaitingSwap,
    Resolving,
    Collapsing,
    Refilling,
    Rescanning,
    Shuffling,
    /// Parked after a game-over request; rejects swaps until restart.
    Halted,
}

impl Phase {
    /// Whether a cascade currently holds the grid.
    ///
    /// `AwaitingSwap` is not busy: one cell is selected and the pipeline is
    /// waiting for the second.
    pub fn is_busy(self) -> bool {
        !matches!(self, Phase::Idle | Phase::AwaitingSwap | Phase::Halted)
    }

    /// Whether a swap request is accepted in this phase.
    pub fn accepts_swap(self) -> bool {
        matches!(self, Phase::Idle | Phase::AwaitingSwap)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingSwap => "awaitingSwap",
            Phase::Resolving => "resolving",
            Phase::Collapsing => "collapsing",
            Phase::Refilling => "refilling",
            Phase::Rescanning => "rescanning",
            Phase::Shuffling => "shuffling",
            Phase::Halted => "halted",
        }
    }
}

/// The unit of work one pipeline advance performed.
///
/// Drivers wait `settle_ms()` after each step before advancing again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Two items exchanged cells
    Swap,
    /// A swap without a match was undone
    Revert,
    /// A match set was computed
    Resolve,
    /// Matched items were removed
    Explode,
    /// Gravity was applied
    Shift,
    /// Gaps were refilled
    Fill,
    /// The whole board was scanned
    Rescan,
    /// Items were redistributed
    Shuffle,
    /// The pipeline parked in `Phase::Halted`
    Halt,
}

impl Step {
    pub fn settle_ms(self) -> u32 {
        match self {
            Step::Swap | Step::Revert => SWAP_SETTLE_MS,
            Step::Explode => EXPLODE_SETTLE_MS,
            Step::Shift => SHIFT_SETTLE_MS,
            Step::Fill => FILL_SETTLE_MS,
            Step::Shuffle => SHUFFLE_SETTLE_MS,
            Step::Resolve | Step::Rescan | Step::Halt => 0,
        }
    }
}

/// Observable outcome of cascade work, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEvent {
    Swapped { a: Coord, b: Coord },
    /// The swap produced no match and was reverted
    SwapRejected { a: Coord, b: Coord },
    /// `chain` is 0 for the swap itself and counts up for each rescan match
    Matched {
        cells: Vec<Coord>,
        direction: MatchDirection,
        chain: u32,
    },
    BonusTriggered {
        at: Coord,
        kind: BonusKind,
        cells: Vec<Coord>,
    },
    Promoted { at: Coord, kind: BonusKind },
    Shifted { moved: u32 },
    Refilled { cells: Vec<Coord> },
    Shuffled { attempt: u32 },
    /// Shuffling gave up and the board was rebuilt into a solvable layout
    Regenerated,
    /// Back to idle; `hint` is a swap-realizable potential move
    Stable { hint: Vec<Coord> },
    MoveResolved,
    NoMoves,
    Restarted,
    Halted,
}

impl CascadeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CascadeEvent::Swapped { .. } => "swapped",
            CascadeEvent::SwapRejected { .. } => "swapRejected",
            CascadeEvent::Matched { .. } => "matched",
            CascadeEvent::BonusTriggered { .. } => "bonusTriggered",
            CascadeEvent::Promoted { .. } => "promoted",
            CascadeEvent::Shifted { .. } => "shifted",
            CascadeEvent::Refilled { .. } => "refilled",
            CascadeEvent::Shuffled { .. } => "shuffled",
            CascadeEvent::Regenerated => "regenerated",
            CascadeEvent::Stable { .. } => "stable",
            CascadeEvent::MoveResolved => "moveResolved",
            CascadeEvent::NoMoves => "noMoves",
            CascadeEvent::Restarted => "restarted",
            CascadeEvent::Halted => "halted",
        }
    }
}

/// Player/AI intents, shared by keyboard input and the AI protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    /// Select the cursor cell, or swap it with the selected neighbour
    Select,
    /// Swap the cursor cell with its neighbour in a direction
    Swap(Direction),
    Restart,
    /// Reveal the potential-move hint immediately
    Hint,
    /// Toggle pause state
    Pause,
}

impl GameAction {
    /// Parse action from string (for AI protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_match3_types::{Direction, GameAction};
    ///
    /// assert_eq!(GameAction::from_str("cursorUp"), Some(GameAction::CursorUp));
    /// assert_eq!(GameAction::from_str("swapDown"), Some(GameAction::Swap(Direction::Down)));
    /// assert_eq!(GameAction::from_str("hint"), Some(GameAction::Hint));
    /// assert_eq!(GameAction::from_str("hardDrop"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cursorup" => Some(GameAction::CursorUp),
            "cursordown" => Some(GameAction::CursorDown),
            "cursorleft" => Some(GameAction::CursorLeft),
            "cursorright" => Some(GameAction::CursorRight),
            "select" => Some(GameAction::Select),
            "swapup" => Some(GameAction::Swap(Direction::Up)),
            "swapright" => Some(GameAction::Swap(Direction::Right)),
            "swapdown" => Some(GameAction::Swap(Direction::Down)),
            "swapleft" => Some(GameAction::Swap(Direction::Left)),
            "restart" => Some(GameAction::Restart),
            "hint" => Some(GameAction::Hint),
            "pause" => Some(GameAction::Pause),
            _ => None,
        }
    }

    /// Convert to camelCase string for AI protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::CursorUp => "cursorUp",
            GameAction::CursorDown => "cursorDown",
            GameAction::CursorLeft => "cursorLeft",
            GameAction::CursorRight => "cursorRight",
            GameAction::Select => "select",
            GameAction::Swap(Direction::Up) => "swapUp",
            GameAction::Swap(Direction::Right) => "swapRight",
            GameAction::Swap(Direction::Down) => "swapDown",
            GameAction::Swap(Direction::Left) => "swapLeft",
            GameAction::Restart => "restart",
            GameAction::Hint => "hint",
            GameAction::Pause => "pause",
        }
    }
}
