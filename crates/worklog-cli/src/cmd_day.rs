use anyhow::bail;
use clap::Subcommand;
use std::path::Path;

use worklog_core::event::{new_event, EventMeta};
use worklog_core::{clock, DayClosedPayload, EventKind, SessionRef, SummaryMode};
use worklog_derive::{day_status, open_captures};
use worklog_ledger::{Config, Ledger};
use worklog_summary::append_journal_entry;

#[derive(Subcommand)]
pub enum DayCmd {
    /// Show the day's state: closure, sessions, orphans, open captures
    Status {
        #[arg(long)]
        day_id: Option<String>,
    },
    /// Close the day and generate the nightly summary
    Close {
        #[arg(long)]
        day_id: Option<String>,
    },
}

pub fn run(cmd: DayCmd, data_root: &Path) -> anyhow::Result<()> {
    match cmd {
        DayCmd::Status { day_id } => status(data_root, day_id.as_deref()),
        DayCmd::Close { day_id } => close(data_root, day_id.as_deref()),
    }
}

pub fn status(data_root: &Path, day_id: Option<&str>) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let day = day_id.map(|d| d.to_string()).unwrap_or_else(clock::today);
    let status = day_status(&replay.events, &day);
    let open = open_captures(&replay.events, Some(&day), None);

    println!("Day {day}");
    match &status.closed_at {
        Some(ts) => println!("  closed at {ts}"),
        None => println!("  open"),
    }
    for s in &status.active {
        println!("  active: {} (started {})", s.session_id, s.start_ts);
    }
    for s in &status.paused {
        println!("  paused: {} (started {})", s.session_id, s.start_ts);
    }
    println!("  open captures: {}", open.len());
    if replay.skipped > 0 {
        eprintln!("warning: skipped {} malformed log line(s)", replay.skipped);
    }
    Ok(())
}

pub fn close(data_root: &Path, day_id: Option<&str>) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let day = day_id.map(|d| d.to_string()).unwrap_or_else(clock::today);
    let status = day_status(&replay.events, &day);

    if status.closed {
        bail!(
            "day {day} is already closed (at {}).",
            status.closed_at.as_deref().unwrap_or("unknown")
        );
    }
    if !status.orphans.is_empty() {
        let listing: Vec<String> = status
            .orphans
            .iter()
            .map(|s| format!("{} (started {})", s.session_id, s.start_ts))
            .collect();
        bail!(
            "cannot close day {day} with open sessions: {}. \
             End them (`worklog session end`) or force-close (`worklog session close <id>`).",
            listing.join(", ")
        );
    }

    let closed_at = clock::now_ts();
    let event = new_event(
        EventKind::DayClosed(DayClosedPayload {
            closed_at: closed_at.clone(),
        }),
        EventMeta {
            session: Some(SessionRef::scoped(day.clone(), None)),
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    append_journal_entry(
        &ledger.paths.journal_file(&day),
        &day,
        &event.ts,
        "day closed",
    )?;

    // Day closure always produces the nightly document.
    let config = Config::load(&ledger.paths);
    let outcome = worklog_summary::generate(&ledger, &config, SummaryMode::Nightly, &day, true)?;
    println!("Closed day {day}");
    println!("  assessment: {}", outcome.payload.assessment);
    println!("  summary: {}", outcome.markdown_path.display());
    Ok(())
}
