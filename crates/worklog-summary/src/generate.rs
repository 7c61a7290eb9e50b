//! Summary generation: replay, score, render, append.

use crate::{analyze, journal, render};
use anyhow::{bail, Result};
use std::path::PathBuf;
use worklog_core::event::{new_event, EventMeta};
use worklog_core::{clock, Delta, Event, EventKind, Link, SessionRef, SummaryMode, SummaryPayload};
use worklog_derive::{build_sessions, day_status, open_captures};
use worklog_ledger::{Config, Ledger};

/// Everything one generation run produced: the appended event, its
/// payload, and the artifact pair on disk.
#[derive(Debug)]
pub struct SummaryOutcome {
    pub event: Event,
    pub payload: SummaryPayload,
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
    /// Malformed log lines skipped during replay, surfaced for warnings.
    pub skipped: usize,
}

/// Generate one summary for a day and append it to the log.
///
/// Preconditions unless `force`: rolling needs an active session, nightly
/// needs the day closed. The artifact pair is immutable; each run writes a
/// new version keyed by the window end.
pub fn generate(
    ledger: &Ledger,
    config: &Config,
    mode: SummaryMode,
    day_id: &str,
    force: bool,
) -> Result<SummaryOutcome> {
    let replay = ledger.read_all()?;
    let events = &replay.events;
    let day_events: Vec<&Event> = events
        .iter()
        .filter(|e| e.session.day_id == day_id)
        .collect();
    if day_events.is_empty() {
        bail!("no data for day {day_id}");
    }

    match mode {
        SummaryMode::Rolling => {
            if !force && build_sessions(events).active(None).session.is_none() {
                bail!(
                    "no active session; a rolling summary describes work in flight. \
                     Start one with `worklog session start`."
                );
            }
        }
        SummaryMode::Nightly => {
            if !force && !day_status(events, day_id).closed {
                bail!(
                    "day {day_id} is not closed. Close it with `worklog day close`, \
                     or pass --force."
                );
            }
        }
    }

    // Window covers everything the day has seen so far.
    let window_start = day_events.iter().map(|e| e.ts.as_str()).min().unwrap_or_default();
    let window_end = day_events.iter().map(|e| e.ts.as_str()).max().unwrap_or_default();
    let version = format!("{mode}_{}", clock::version_token(window_end));

    let analysis = analyze::assess(events, day_id, config.recent_window);
    let delta = match mode {
        SummaryMode::Rolling => {
            let summaries = ledger.read_summaries()?.events;
            let prior = analyze::latest_prior_rolling(&summaries, day_id);
            analyze::rolling_delta(events, prior.as_ref(), day_id, analysis.assessment)
        }
        SummaryMode::Nightly => Delta::default(),
    };
    let objective = journal::read_objective(&ledger.paths.journal_file(day_id));

    let artifact_ref = format!("artifacts/summaries/{day_id}/{version}.md");
    let payload = SummaryPayload {
        day_id: day_id.to_string(),
        mode,
        window_start: window_start.to_string(),
        window_end: window_end.to_string(),
        summary_version: version.clone(),
        assessment: analysis.assessment,
        next_step: analysis.next_step,
        blocker: analysis.blocker,
        risks: analysis.risks,
        delta,
        objective,
        artifact_ref: artifact_ref.clone(),
    };

    let open = open_captures(events, Some(day_id), None);
    let sessions = build_sessions(events).for_day(day_id).len();
    let markdown = render::render_markdown(&payload, &open, sessions);

    let dir = ledger.paths.summary_dir(day_id);
    std::fs::create_dir_all(&dir)?;
    let markdown_path = dir.join(format!("{version}.md"));
    let json_path = dir.join(format!("{version}.json"));
    std::fs::write(&markdown_path, &markdown)?;
    std::fs::write(&json_path, serde_json::to_string_pretty(&payload)?)?;

    let kind = match mode {
        SummaryMode::Rolling => EventKind::RollingSummaryGenerated(payload.clone()),
        SummaryMode::Nightly => EventKind::DailySummaryGenerated(payload.clone()),
    };
    let event = new_event(
        kind,
        EventMeta {
            session: Some(SessionRef::scoped(day_id, None)),
            links: vec![Link::artifact(&artifact_ref)],
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    tracing::info!(%day_id, %version, assessment = %payload.assessment, "summary generated");

    Ok(SummaryOutcome {
        event,
        payload,
        markdown_path,
        json_path,
        skipped: replay.skipped,
    })
}
