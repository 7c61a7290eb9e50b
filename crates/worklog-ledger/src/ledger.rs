use crate::paths::WorklogPaths;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use worklog_core::Event;

/// Result of replaying one NDJSON file: parsed events in append order,
/// plus the number of unparsable lines that were skipped. A single
/// corrupt line never makes the rest of the history unreadable.
#[derive(Debug, Default)]
pub struct Replay {
    pub events: Vec<Event>,
    pub skipped: usize,
}

/// The append-only event log backed by `index/events.ndjson`, with the
/// `sessions` and `summaries` files maintained as write-time projections.
///
/// There is deliberately no cross-process lock around `append`: each call
/// writes one whole line (or an explicit small batch) and concurrent
/// writers may interleave. Callers needing stronger guarantees must
/// serialize externally.
pub struct Ledger {
    pub paths: WorklogPaths,
}

impl Ledger {
    /// Open an existing data root. Fails if it was never initialized.
    pub fn open(data_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let paths = WorklogPaths::discover(data_root);
        if !paths.is_initialized() {
            anyhow::bail!(
                "no worklog data root at {}. Run `worklog init` first.",
                paths.root.display()
            );
        }
        Ok(Self { paths })
    }

    /// Initialize the data root layout and open it.
    pub fn init(data_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let paths = WorklogPaths::discover(data_root);
        paths.ensure_layout()?;
        Ok(Self { paths })
    }

    /// Append one event. The event also lands in the `sessions` projection
    /// when it is a lifecycle transition, and in the `summaries` projection
    /// when it is a summary event.
    pub fn append(&self, event: &Event) -> anyhow::Result<()> {
        append_line(&self.paths.events_ndjson, event)?;
        if event.kind.is_lifecycle() {
            append_line(&self.paths.sessions_ndjson, event)?;
        }
        if event.kind.is_summary() {
            append_line(&self.paths.summaries_ndjson, event)?;
        }
        tracing::debug!(event_id = %event.event_id, kind = event.kind.type_name(), "appended event");
        Ok(())
    }

    /// Append an explicit small batch in order.
    pub fn append_all(&self, events: &[Event]) -> anyhow::Result<()> {
        for event in events {
            self.append(event)?;
        }
        Ok(())
    }

    /// Replay the full event log in append order.
    pub fn read_all(&self) -> anyhow::Result<Replay> {
        read_ndjson(&self.paths.events_ndjson)
    }

    /// Replay the summaries projection only.
    pub fn read_summaries(&self) -> anyhow::Result<Replay> {
        read_ndjson(&self.paths.summaries_ndjson)
    }

    /// Replay the sessions (lifecycle) projection only.
    pub fn read_sessions(&self) -> anyhow::Result<Replay> {
        read_ndjson(&self.paths.sessions_ndjson)
    }
}

fn append_line(path: &Path, event: &Event) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;
    Ok(())
}

fn read_ndjson(path: &Path) -> anyhow::Result<Replay> {
    if !path.exists() {
        return Ok(Replay::default());
    }
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut replay = Replay::default();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => replay.events.push(event),
            Err(err) => {
                replay.skipped += 1;
                tracing::warn!(%err, "skipping malformed log line");
            }
        }
    }
    Ok(replay)
}
