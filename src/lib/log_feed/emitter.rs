use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use log::warn;
use serde::Serialize;

use super::models::LogEntry;

/// Name of the event a front end listens to for fresh feed entries.
pub const NEW_LOG_EVENT: &str = "newLog";

/// A trait, necessary for every front end that wants to be pushed feed entries
/// as they are recorded.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &str, entry: &LogEntry);
}

/// Used when nothing is attached to the feed.
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: &str, _entry: &LogEntry) {}
}

#[derive(Serialize)]
struct EventLine<'a> {
    event: &'a str,
    payload: &'a LogEntry,
}

fn write_line<W: Write>(writer: &mut W, line: &EventLine<'_>) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, line)?;
    writeln!(writer)?;
    writer.flush()
}

/// Writes every event as a single JSON line, e.g.
/// `{"event":"newLog","payload":{"timestamp":"...","message":"...","type":"info"}}`.
pub struct JsonLinesEmitter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesEmitter {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventEmitter for JsonLinesEmitter<W> {
    fn emit(&self, event: &str, entry: &LogEntry) {
        let line = EventLine {
            event,
            payload: entry,
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = write_line(&mut *writer, &line) {
            warn!("Could not emit {} event: {}", event, err);
        }
    }
}
