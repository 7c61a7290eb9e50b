//! Day assessment heuristics and rolling deltas.

use std::collections::HashSet;

use worklog_core::{Assessment, Delta, Event, EventKind, SummaryPayload};
use worklog_derive::open_captures;

/// Scored state of a day, feeding both summary modes.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub assessment: Assessment,
    pub next_step: String,
    pub blocker: Option<String>,
    pub risks: Vec<String>,
}

/// Assessment priority is fixed: unfixed captures beat everything, then
/// commit hygiene, then on-track. The day is scored as a whole, so a
/// blocked morning stays visible even if the current session is clean.
pub fn assess(events: &[Event], day_id: &str, recent_window: usize) -> Analysis {
    let open = open_captures(events, Some(day_id), None);
    if !open.is_empty() {
        let latest = &open[0];
        return Analysis {
            assessment: Assessment::Blocked,
            next_step: format!(
                "Fix the latest capture and link it: worklog fix (targets {})",
                latest.event_id
            ),
            blocker: Some(format!(
                "{} unfixed capture(s); latest: {}",
                open.len(),
                latest.title
            )),
            risks: vec!["unresolved errors accumulating".to_string()],
        };
    }

    let day_events: Vec<&Event> = events
        .iter()
        .filter(|e| e.session.day_id == day_id)
        .collect();
    let overdue = day_events
        .iter()
        .any(|e| matches!(e.kind, EventKind::CommitOverdue(_)));
    let activity = day_events.iter().any(|e| e.kind.is_lifecycle());
    let suggestions = day_events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::CommitSuggestionIssued(_)))
        .count();
    // A capture with a linked fix is resolved work, not lingering risk.
    let fixed: HashSet<&str> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::FixLinked(p) => Some(p.error_event_id.as_str()),
            _ => None,
        })
        .collect();
    let recent_risky = day_events.iter().rev().take(recent_window).any(|e| {
        (e.kind.is_capture() && !fixed.contains(e.event_id.as_str()))
            || matches!(e.kind, EventKind::RepoDiffComputed(_))
    });

    if overdue || (activity && suggestions == 0 && recent_risky) {
        return Analysis {
            assessment: Assessment::OffTrack,
            next_step: "Commit the work in progress: worklog suggest".to_string(),
            blocker: None,
            risks: vec!["uncommitted changes at risk of being lost".to_string()],
        };
    }

    Analysis {
        assessment: Assessment::OnTrack,
        next_step: "Continue with the session intent".to_string(),
        blocker: None,
        risks: Vec::new(),
    }
}

/// Latest prior rolling summary for a day, from the summaries projection.
pub fn latest_prior_rolling(summaries: &[Event], day_id: &str) -> Option<SummaryPayload> {
    summaries.iter().rev().find_map(|e| match &e.kind {
        EventKind::RollingSummaryGenerated(p) if p.day_id == day_id => Some(p.clone()),
        _ => None,
    })
}

/// What changed since the prior rolling summary. Events with ts strictly
/// greater than the prior window end are new; summary events themselves
/// are excluded from the work counts. With no prior summary, the whole
/// day is new and `assessment_changed` stays false.
pub fn rolling_delta(
    events: &[Event],
    prior: Option<&SummaryPayload>,
    day_id: &str,
    current: Assessment,
) -> Delta {
    let since = prior.map(|p| p.window_end.as_str());
    let new: Vec<&Event> = events
        .iter()
        .filter(|e| e.session.day_id == day_id && !e.kind.is_summary())
        .filter(|e| match since {
            Some(cutoff) => e.ts.as_str() > cutoff,
            None => true,
        })
        .collect();
    Delta {
        new_events: new.len(),
        new_commit_suggestions: new
            .iter()
            .filter(|e| matches!(e.kind, EventKind::CommitSuggestionIssued(_)))
            .count(),
        new_captures: new.iter().filter(|e| e.kind.is_capture()).count(),
        assessment_changed: prior.map(|p| p.assessment != current).unwrap_or(false),
    }
}
