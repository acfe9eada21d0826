#![warn(missing_docs)]
//! Deterministic testing surfaces: JSONL event stream, snapshots and
//! micro-worldtests for the headless simulation.

mod micro_worldtest;
mod snapshot;

use anyhow::{Context, Result};
use cubeworld_core::SimTick;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use micro_worldtest::*;
pub use snapshot::*;

/// Primary event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Physics tick when the event occurred.
    pub tick: SimTick,
    /// Short kind label (`break`, `place`, `jump`, ...).
    pub kind: &'a str,
    /// Structured payload.
    pub payload: Value,
}

/// Header written once at the start of an event log.
#[derive(Debug, Serialize)]
pub struct SessionHeader<'a> {
    /// Session label.
    pub session: &'a str,
    /// World seed the session ran with.
    pub seed: u64,
    /// Wall-clock start time (RFC 3339). Not part of any determinism check.
    pub started_at: String,
}

impl<'a> SessionHeader<'a> {
    /// Header stamped with the current UTC time.
    pub fn now(session: &'a str, seed: u64) -> Self {
        Self {
            session,
            seed,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A sink that writes newline-delimited JSON.
pub struct JsonlSink {
    out: Box<dyn Write + Send>,
    lines: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Wrap an arbitrary writer.
    pub fn from_writer<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Box::new(out),
            lines: 0,
        }
    }

    /// Append one serializable record as a line.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
