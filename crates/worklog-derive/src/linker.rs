//! Capture, fix, and commit linkage derived from the log.
//!
//! Every answer here is a pure fold over the ordered event slice. Nothing
//! is cached between calls; callers re-read the log and re-derive.

use serde::Serialize;
use worklog_core::{Event, EventKind, FixCommittedPayload, FixLinkedPayload};

/// Outcome of content-hash deduplication for a new capture.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureClass {
    Created,
    /// A capture with the same hash already exists; `original_event_id`
    /// is the FIRST such capture in log order.
    Reoccurred { original_event_id: String },
}

/// Classify new capture content against the log. Matches both created and
/// reoccurred events so a recurrence always points at the earliest sighting.
pub fn classify_capture(events: &[Event], error_hash: &str) -> CaptureClass {
    for event in events {
        let hash = match &event.kind {
            EventKind::CaptureCreated(p) => &p.error_hash,
            EventKind::CaptureReoccurred(p) => &p.error_hash,
            _ => continue,
        };
        if hash == error_hash {
            // A recurrence chain collapses to its root.
            if let EventKind::CaptureReoccurred(p) = &event.kind {
                return CaptureClass::Reoccurred {
                    original_event_id: p.original_event_id.clone(),
                };
            }
            return CaptureClass::Reoccurred {
                original_event_id: event.event_id.clone(),
            };
        }
    }
    CaptureClass::Created
}

/// A prior capture whose title shares vocabulary with a new one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarCapture {
    pub event_id: String,
    pub ts: String,
    pub title: String,
    pub error_hash: String,
    pub shared_tokens: Vec<String>,
}

fn title_tokens(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_string())
        .collect()
}

/// Captures whose titles share at least two meaningful tokens with
/// `title`, excluding exact-hash matches (those are recurrences, not
/// lookalikes). Advisory output; never blocks a capture.
pub fn similar_captures(events: &[Event], title: &str, error_hash: &str) -> Vec<SimilarCapture> {
    let new_tokens = title_tokens(title);
    let mut out = Vec::new();
    for event in events {
        let (existing_title, existing_hash) = match &event.kind {
            EventKind::CaptureCreated(p) => (&p.title, &p.error_hash),
            EventKind::CaptureReoccurred(p) => (&p.title, &p.error_hash),
            _ => continue,
        };
        if existing_hash == error_hash {
            continue;
        }
        let shared: Vec<String> = title_tokens(existing_title)
            .into_iter()
            .filter(|t| new_tokens.contains(t))
            .collect();
        if shared.len() >= 2 {
            out.push(SimilarCapture {
                event_id: event.event_id.clone(),
                ts: event.ts.clone(),
                title: existing_title.clone(),
                error_hash: existing_hash.clone(),
                shared_tokens: shared,
            });
        }
    }
    out
}

/// A capture event with no fix linked to it yet. Both first sightings and
/// recurrences are obligations until a fix names their event id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenCapture {
    pub event_id: String,
    pub ts: String,
    pub title: String,
    pub error_hash: String,
    pub day_id: String,
    pub session_id: Option<String>,
    pub artifact_ref: String,
}

fn open_capture_from(event: &Event) -> Option<OpenCapture> {
    let (title, error_hash, artifact_ref) = match &event.kind {
        EventKind::CaptureCreated(p) => (&p.title, &p.error_hash, &p.artifact_ref),
        EventKind::CaptureReoccurred(p) => (&p.title, &p.error_hash, &p.artifact_ref),
        _ => return None,
    };
    Some(OpenCapture {
        event_id: event.event_id.clone(),
        ts: event.ts.clone(),
        title: title.clone(),
        error_hash: error_hash.clone(),
        day_id: event.session.day_id.clone(),
        session_id: event.session.session_id.clone(),
        artifact_ref: artifact_ref.clone(),
    })
}

/// All capture events not yet referenced by a `FixLinked.error_event_id`,
/// newest first. Keyed per event, never grouped by hash: fixing one
/// occurrence leaves its siblings open.
pub fn open_captures(
    events: &[Event],
    day_id: Option<&str>,
    session_id: Option<&str>,
) -> Vec<OpenCapture> {
    let fixed: Vec<&str> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::FixLinked(p) => Some(p.error_event_id.as_str()),
            _ => None,
        })
        .collect();

    let mut out: Vec<OpenCapture> = events
        .iter()
        .filter(|e| match day_id {
            Some(d) => e.session.day_id == d,
            None => true,
        })
        .filter(|e| match session_id {
            Some(s) => e.session.session_id.as_deref() == Some(s),
            None => true,
        })
        .filter(|e| !fixed.contains(&e.event_id.as_str()))
        .filter_map(open_capture_from)
        .collect();
    out.sort_by(|a, b| b.ts.cmp(&a.ts));
    out
}

/// Most recent capture without a fix, if any.
pub fn latest_unfixed(events: &[Event]) -> Option<OpenCapture> {
    open_captures(events, None, None).into_iter().next()
}

/// Locate a capture by exact event id or by artifact path fragment.
pub fn find_capture(events: &[Event], needle: &str) -> Option<OpenCapture> {
    events
        .iter()
        .filter_map(open_capture_from)
        .find(|c| c.event_id == needle || c.artifact_ref.contains(needle))
}

pub fn find_fix(events: &[Event], fix_id: &str) -> Option<(String, FixLinkedPayload)> {
    events.iter().find_map(|e| match &e.kind {
        EventKind::FixLinked(p) if p.fix_id == fix_id => Some((e.event_id.clone(), p.clone())),
        _ => None,
    })
}

/// An existing commit binding for a fix id makes `fix commit` a no-op.
pub fn commit_binding(events: &[Event], fix_id: &str) -> Option<FixCommittedPayload> {
    events.iter().find_map(|e| match &e.kind {
        EventKind::FixCommitted(p) if p.fix_id == fix_id => Some(p.clone()),
        _ => None,
    })
}

/// The most recent capture -> fix -> commit chain, for display.
#[derive(Debug, Clone, Serialize)]
pub struct ChainView {
    pub fix_event_id: String,
    pub fix: FixLinkedPayload,
    pub capture: Option<OpenCapture>,
    pub committed: Option<FixCommittedPayload>,
}

pub fn latest_chain(events: &[Event]) -> Option<ChainView> {
    let (fix_event_id, fix) = events.iter().rev().find_map(|e| match &e.kind {
        EventKind::FixLinked(p) => Some((e.event_id.clone(), p.clone())),
        _ => None,
    })?;
    let capture = events
        .iter()
        .filter(|e| e.event_id == fix.error_event_id)
        .find_map(open_capture_from);
    let committed = commit_binding(events, &fix.fix_id);
    Some(ChainView {
        fix_event_id,
        fix,
        capture,
        committed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    const DAY: &str = "2026-08-29";

    #[test]
    fn first_capture_of_a_hash_is_created() {
        let events = vec![capture("evt_1", DAY, "S01", "09:00", "aaa", "panic in loader")];
        assert_eq!(classify_capture(&events, "bbb"), CaptureClass::Created);
    }

    #[test]
    fn same_hash_classifies_as_reoccurred_at_first_original() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "panic in loader"),
            capture("evt_2", DAY, "S01", "09:30", "aaa", "panic in loader"),
        ];
        assert_eq!(
            classify_capture(&events, "aaa"),
            CaptureClass::Reoccurred {
                original_event_id: "evt_1".to_string()
            }
        );
    }

    #[test]
    fn recurrence_chain_collapses_to_root() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "panic in loader"),
            reoccurred("evt_2", DAY, "S01", "10:00", "aaa", "evt_1"),
        ];
        assert_eq!(
            classify_capture(&events, "aaa"),
            CaptureClass::Reoccurred {
                original_event_id: "evt_1".to_string()
            }
        );
    }

    #[test]
    fn similar_requires_two_shared_tokens_and_skips_same_hash() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "timeout in fetch loop"),
            capture("evt_2", DAY, "S01", "09:10", "bbb", "timeout waiting for fetch"),
            capture("evt_3", DAY, "S01", "09:20", "ccc", "timeout elsewhere"),
        ];
        let hits = similar_captures(&events, "fetch timeout again", "aaa");
        // evt_1 shares hash aaa so it is a recurrence, not a lookalike.
        // evt_3 shares only "timeout".
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event_id, "evt_2");
        assert!(hits[0].shared_tokens.contains(&"timeout".to_string()));
        assert!(hits[0].shared_tokens.contains(&"fetch".to_string()));
    }

    #[test]
    fn short_tokens_do_not_count_as_shared() {
        let events = vec![capture("evt_1", DAY, "S01", "09:00", "aaa", "it is in db")];
        assert!(similar_captures(&events, "it is on db", "zzz").is_empty());
    }

    #[test]
    fn dedup_never_hides_the_open_obligation() {
        // Recurrences stay in the unfixed set alongside the original.
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "panic in loader"),
            reoccurred("evt_2", DAY, "S02", "10:00", "aaa", "evt_1"),
        ];
        let open = open_captures(&events, None, None);
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].event_id, "evt_2");
        assert_eq!(open[1].event_id, "evt_1");
    }

    #[test]
    fn fix_closes_only_the_named_event() {
        // Captures sharing a hash are independent obligations.
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "panic in loader"),
            reoccurred("evt_2", DAY, "S01", "10:00", "aaa", "evt_1"),
            fix("evt_3", DAY, "S01", "10:30", "fix_x", "evt_1"),
        ];
        let open = open_captures(&events, None, None);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].event_id, "evt_2");
    }

    #[test]
    fn open_captures_filter_by_day_and_session() {
        let events = vec![
            capture("evt_1", "2026-08-28", "S01", "09:00", "aaa", "one"),
            capture("evt_2", DAY, "S01", "09:00", "bbb", "two"),
            capture("evt_3", DAY, "S02", "09:30", "ccc", "three"),
        ];
        assert_eq!(open_captures(&events, Some(DAY), None).len(), 2);
        assert_eq!(open_captures(&events, Some(DAY), Some("S02")).len(), 1);
        assert_eq!(open_captures(&events, None, None).len(), 3);
    }

    #[test]
    fn latest_unfixed_is_newest_open_capture() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "one"),
            capture("evt_2", DAY, "S01", "09:30", "bbb", "two"),
            fix("evt_3", DAY, "S01", "10:00", "fix_x", "evt_2"),
        ];
        assert_eq!(latest_unfixed(&events).unwrap().event_id, "evt_1");
    }

    #[test]
    fn latest_unfixed_none_when_all_fixed() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "one"),
            fix("evt_2", DAY, "S01", "10:00", "fix_x", "evt_1"),
        ];
        assert!(latest_unfixed(&events).is_none());
    }

    #[test]
    fn find_capture_by_id_or_artifact_fragment() {
        let events = vec![capture("evt_1", DAY, "S01", "09:00", "aaa", "one")];
        assert!(find_capture(&events, "evt_1").is_some());
        assert!(find_capture(&events, "evt_1.txt").is_some());
        assert!(find_capture(&events, "evt_9").is_none());
    }

    #[test]
    fn commit_binding_is_found_by_fix_id() {
        let mut events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "one"),
            fix("evt_2", DAY, "S01", "10:00", "fix_x", "evt_1"),
        ];
        assert!(commit_binding(&events, "fix_x").is_none());
        events.push(envelope(
            "evt_3",
            &at(DAY, "10:30"),
            worklog_core::EventKind::FixCommitted(worklog_core::FixCommittedPayload {
                fix_id: "fix_x".to_string(),
                fix_event_id: "evt_2".to_string(),
                error_event_id: "evt_1".to_string(),
                commit_sha: "abc123".to_string(),
            }),
            DAY,
            Some("S01"),
        ));
        let binding = commit_binding(&events, "fix_x").unwrap();
        assert_eq!(binding.commit_sha, "abc123");
        // A second lookup returns the same binding; callers treat this as
        // already-committed and append nothing.
        assert_eq!(commit_binding(&events, "fix_x").unwrap(), binding);
    }

    #[test]
    fn latest_chain_joins_capture_fix_and_commit() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "one"),
            fix("evt_2", DAY, "S01", "10:00", "fix_x", "evt_1"),
            envelope(
                "evt_3",
                &at(DAY, "10:30"),
                worklog_core::EventKind::FixCommitted(worklog_core::FixCommittedPayload {
                    fix_id: "fix_x".to_string(),
                    fix_event_id: "evt_2".to_string(),
                    error_event_id: "evt_1".to_string(),
                    commit_sha: "abc123".to_string(),
                }),
                DAY,
                Some("S01"),
            ),
        ];
        let chain = latest_chain(&events).unwrap();
        assert_eq!(chain.fix_event_id, "evt_2");
        assert_eq!(chain.capture.unwrap().event_id, "evt_1");
        assert_eq!(chain.committed.unwrap().commit_sha, "abc123");
    }

    #[test]
    fn latest_chain_none_without_fixes() {
        let events = vec![capture("evt_1", DAY, "S01", "09:00", "aaa", "one")];
        assert!(latest_chain(&events).is_none());
    }

    #[test]
    fn find_fix_returns_event_id_and_payload() {
        let events = vec![
            capture("evt_1", DAY, "S01", "09:00", "aaa", "one"),
            fix("evt_2", DAY, "S01", "10:00", "fix_x", "evt_1"),
        ];
        let (event_id, payload) = find_fix(&events, "fix_x").unwrap();
        assert_eq!(event_id, "evt_2");
        assert_eq!(payload.error_event_id, "evt_1");
        assert!(find_fix(&events, "fix_y").is_none());
    }
}
