//! Structured JSON-lines journal of cascade events.
//!
//! The terminal owns stdout while the game runs, so diagnostics go to a file
//! instead: one `{"ts_ms":..,"level":..,"target":..,"message":..,"fields":{..}}`
//! object per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::GameObserver;
use crate::protocol::{current_timestamp_ms, pair_of};
use crate::types::{CascadeEvent, Coord};

pub type LogFields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub ts_ms: u64,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "LogFields::is_empty", default)]
    pub fields: LogFields,
}

impl LogEvent {
    pub fn new(level: LogLevel, target: &str, message: &str) -> Self {
        Self {
            ts_ms: current_timestamp_ms(),
            level,
            target: target.to_string(),
            message: message.to_string(),
            fields: LogFields::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Append-only file sink, truncated once it would exceed `max_bytes`
/// (0 = unbounded).
pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    written: u64,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>, max_bytes: u64) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            written,
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, event: &LogEvent) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let len = line.len() as u64;

        if self.max_bytes > 0 && self.written + len > self.max_bytes {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            self.writer = BufWriter::new(file);
            self.written = 0;
        }

        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.written += len;
        Ok(())
    }
}

/// Cascade event journal. Disabled journals drop everything.
#[derive(Default)]
pub struct Journal {
    sink: Option<FileSink>,
    /// Write failures since the journal was opened
    failures: u32,
}

impl Journal {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn to_file(path: impl AsRef<Path>, max_bytes: u64) -> anyhow::Result<Self> {
        Ok(Self {
            sink: Some(FileSink::open(path, max_bytes)?),
            failures: 0,
        })
    }

    /// `MATCH3_LOG_PATH` enables the journal; `MATCH3_LOG_MAX_BYTES` bounds it.
    pub fn from_env() -> anyhow::Result<Self> {
        let Some(path) = std::env::var("MATCH3_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        else {
            return Ok(Self::disabled());
        };
        let max_bytes = std::env::var("MATCH3_LOG_MAX_BYTES")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        Self::to_file(path, max_bytes)
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn log(&mut self, event: LogEvent) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if sink.write(&event).is_err() {
            self.failures += 1;
        }
    }

    pub fn info(&mut self, target: &str, message: &str) {
        self.log(LogEvent::new(LogLevel::Info, target, message));
    }
}

fn cells_value(cells: &[Coord]) -> Value {
    json!(cells.iter().copied().map(pair_of).collect::<Vec<_>>())
}

/// Journal entry for a cascade event.
pub fn cascade_entry(event: &CascadeEvent) -> LogEvent {
    let level = match event {
        CascadeEvent::NoMoves | CascadeEvent::Regenerated => LogLevel::Warn,
        CascadeEvent::Shifted { .. } | CascadeEvent::Refilled { .. } | CascadeEvent::Stable { .. } => LogLevel::Debug,
        _ => LogLevel::Info,
    };
    let entry = LogEvent::new(level, "cascade", event.name());
    match event {
        CascadeEvent::Swapped { a, b } | CascadeEvent::SwapRejected { a, b } => {
            entry.field("a", json!(pair_of(*a))).field("b", json!(pair_of(*b)))
        }
        CascadeEvent::Matched {
            cells,
            direction,
            chain,
        } => entry
            .field("cells", cells_value(cells))
            .field("direction", direction.as_str())
            .field("chain", *chain),
        CascadeEvent::BonusTriggered { at, kind, cells } => entry
            .field("at", json!(pair_of(*at)))
            .field("bonus", kind.as_str())
            .field("cleared", cells.len()),
        CascadeEvent::Promoted { at, kind } => entry.field("at", json!(pair_of(*at))).field("bonus", kind.as_str()),
        CascadeEvent::Shifted { moved } => entry.field("moved", *moved),
        CascadeEvent::Refilled { cells } => entry.field("filled", cells.len()),
        CascadeEvent::Stable { hint } => entry.field("hint", cells_value(hint)),
        CascadeEvent::Shuffled { attempt } => entry.field("attempt", *attempt),
        CascadeEvent::Regenerated
        | CascadeEvent::MoveResolved
        | CascadeEvent::NoMoves
        | CascadeEvent::Restarted
        | CascadeEvent::Halted => entry,
    }
}

impl GameObserver for Journal {
    fn on_event(&mut self, event: &CascadeEvent) {
        if self.is_enabled() {
            self.log(cascade_entry(event));
        }
    }
}
