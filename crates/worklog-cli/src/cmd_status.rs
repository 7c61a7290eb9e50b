use std::path::Path;

use worklog_core::{clock, EventKind};
use worklog_derive::{build_sessions, day_status, open_captures};
use worklog_ledger::Ledger;

/// `worklog status`: one-screen view of the current day.
pub fn execute(data_root: &Path) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    if replay.skipped > 0 {
        eprintln!("warning: skipped {} malformed log line(s)", replay.skipped);
    }

    let day = clock::today();
    println!("Day: {day}");

    let status = day_status(&replay.events, &day);
    match &status.closed_at {
        Some(ts) => println!("Day closed at {ts}"),
        None => println!("Day open"),
    }

    let index = build_sessions(&replay.events);
    let selection = index.current(None);
    for anomaly in &selection.anomalies {
        eprintln!("warning: {anomaly}");
    }
    match &selection.session {
        Some(session) => {
            let state = if session.is_paused() { "paused" } else { "active" };
            println!("Session: {} ({state})", session.session_id);
            if let Some(intent) = &session.intent {
                println!("Intent: {intent}");
            }
            if let Some(path) = session.repo_path() {
                println!("Repo: {path}");
            }
        }
        None => println!("Session: none"),
    }

    let open = open_captures(&replay.events, Some(day.as_str()), None);
    println!("Open captures: {}", open.len());
    for capture in open.iter().take(5) {
        println!("  {} {} ({})", capture.ts, capture.title, capture.event_id);
    }

    let latest_summary = replay.events.iter().rev().find_map(|e| match &e.kind {
        EventKind::RollingSummaryGenerated(p) | EventKind::DailySummaryGenerated(p) => Some(p),
        _ => None,
    });
    match latest_summary {
        Some(summary) => {
            println!(
                "Latest summary: {} {} ({})",
                summary.mode, summary.assessment, summary.summary_version
            );
            if !summary.next_step.is_empty() {
                println!("Next step: {}", summary.next_step);
            }
        }
        None => println!("Latest summary: none"),
    }
    Ok(())
}
