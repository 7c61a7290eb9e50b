use serde::Serialize;
use worklog_core::{Actor, Event, EventKind, Project, RepoSnapshot};

/// Lifecycle state of one session, folded from the event log.
/// Keyed by `session_id` scoped to its `(day_id, repo_path)` pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionView {
    pub day_id: String,
    pub session_id: String,
    pub start_ts: String,
    pub end_ts: Option<String>,
    pub last_pause_ts: Option<String>,
    pub last_resume_ts: Option<String>,
    pub intent: Option<String>,
    pub dod: Option<String>,
    pub mode: Option<String>,
    pub result: Option<String>,
    pub repo: Option<RepoSnapshot>,
    pub actor: Actor,
    pub project: Project,
    /// Audit flag: started by the after-day-closed variant. Informational
    /// only, the machine behaves identically.
    pub started_after_close: bool,
    pub forced: bool,
}

impl SessionView {
    pub fn is_open(&self) -> bool {
        self.end_ts.is_none()
    }

    /// Paused iff a pause exists with no resume, or the last pause is
    /// lexicographically >= the last resume. String comparison is sound
    /// because timestamps are fixed-width (see worklog-core clock).
    pub fn is_paused(&self) -> bool {
        match (&self.last_pause_ts, &self.last_resume_ts) {
            (Some(p), Some(r)) => p >= r,
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_open() && !self.is_paused()
    }

    pub fn repo_path(&self) -> Option<&str> {
        self.repo.as_ref().map(|r| r.path.as_str())
    }
}

/// A detected inconsistency, surfaced beside a best-effort answer rather
/// than silently resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Anomaly {
    MultipleActive { session_ids: Vec<String> },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::MultipleActive { session_ids } => write!(
                f,
                "{} sessions are simultaneously active: {}",
                session_ids.len(),
                session_ids.join(", ")
            ),
        }
    }
}

/// Best-effort query answer plus any anomalies the caller must surface.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub session: Option<SessionView>,
    pub anomalies: Vec<Anomaly>,
}

/// Sessions in start order, as folded from the full log.
#[derive(Debug, Default)]
pub struct SessionIndex {
    sessions: Vec<SessionView>,
}

/// Fold the ordered event sequence into per-session lifecycle state.
pub fn build_sessions(events: &[Event]) -> SessionIndex {
    let mut index = SessionIndex::default();
    for event in events {
        let Some(session_id) = event.session.session_id.clone() else {
            continue;
        };
        let day_id = event.session.day_id.clone();
        match &event.kind {
            EventKind::SessionStarted(_) | EventKind::SessionStartedAfterDayClosed(_) => {
                let view = SessionView {
                    day_id: day_id.clone(),
                    session_id: session_id.clone(),
                    start_ts: event.ts.clone(),
                    end_ts: None,
                    last_pause_ts: None,
                    last_resume_ts: None,
                    intent: event.session.intent.clone(),
                    dod: event.session.dod.clone(),
                    mode: event.session.mode.clone(),
                    result: None,
                    repo: event.repo.clone(),
                    actor: event.actor.clone(),
                    project: event.project.clone(),
                    started_after_close: matches!(
                        event.kind,
                        EventKind::SessionStartedAfterDayClosed(_)
                    ),
                    forced: false,
                };
                match index.entry_mut(&day_id, &session_id, event.repo_path()) {
                    Some(existing) => *existing = view,
                    None => index.sessions.push(view),
                }
            }
            EventKind::SessionEnded(p) => {
                if let Some(s) = index.entry_mut(&day_id, &session_id, event.repo_path()) {
                    s.end_ts = Some(event.ts.clone());
                    s.result = event.session.result.clone();
                    if p.forced {
                        s.forced = true;
                    }
                    if let Some(repo) = &event.repo {
                        s.repo = Some(repo.clone());
                    }
                }
            }
            EventKind::SessionForceClosed(_) => {
                if let Some(s) = index.entry_mut(&day_id, &session_id, event.repo_path()) {
                    s.end_ts = Some(event.ts.clone());
                    s.forced = true;
                    s.result = event.session.result.clone();
                }
            }
            EventKind::SessionPaused(_) => {
                if let Some(s) = index.entry_mut(&day_id, &session_id, event.repo_path()) {
                    s.last_pause_ts = Some(event.ts.clone());
                }
            }
            EventKind::SessionResumed(_) => {
                if let Some(s) = index.entry_mut(&day_id, &session_id, event.repo_path()) {
                    s.last_resume_ts = Some(event.ts.clone());
                }
            }
            _ => {}
        }
    }
    index
}

impl SessionIndex {
    /// Sessions are scoped to `(day_id, repo_path, session_id)`; the same
    /// label on the same day against a different repository is a distinct
    /// session. Events that carry no repo path apply to the most recently
    /// started view with the label.
    fn entry_mut(
        &mut self,
        day_id: &str,
        session_id: &str,
        repo_path: Option<&str>,
    ) -> Option<&mut SessionView> {
        self.sessions.iter_mut().rev().find(|s| {
            s.day_id == day_id
                && s.session_id == session_id
                && match (repo_path, s.repo_path()) {
                    (Some(event_path), Some(view_path)) => event_path == view_path,
                    _ => true,
                }
        })
    }

    pub fn all(&self) -> &[SessionView] {
        &self.sessions
    }

    pub fn for_day(&self, day_id: &str) -> Vec<&SessionView> {
        self.sessions.iter().filter(|s| s.day_id == day_id).collect()
    }

    fn matches_repo(session: &SessionView, repo_path: Option<&str>) -> bool {
        match repo_path {
            Some(path) => session.repo_path() == Some(path),
            None => true,
        }
    }

    fn select(&self, repo_path: Option<&str>, require_active: bool) -> Selection {
        let active_ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|s| s.is_active() && Self::matches_repo(s, repo_path))
            .map(|s| s.session_id.clone())
            .collect();
        let mut anomalies = Vec::new();
        if active_ids.len() > 1 {
            anomalies.push(Anomaly::MultipleActive {
                session_ids: active_ids,
            });
        }

        // Reverse start order: the most recently started match wins.
        let session = self
            .sessions
            .iter()
            .rev()
            .find(|s| {
                s.is_open()
                    && (!require_active || !s.is_paused())
                    && Self::matches_repo(s, repo_path)
            })
            .cloned();
        Selection { session, anomalies }
    }

    /// Most recently started, not-yet-ended session, paused or not.
    pub fn current(&self, repo_path: Option<&str>) -> Selection {
        self.select(repo_path, false)
    }

    /// Like `current`, additionally excluding paused sessions.
    pub fn active(&self, repo_path: Option<&str>) -> Selection {
        self.select(repo_path, true)
    }
}

/// Allocate the next per-day sequential label: `S{n+1:02}` where n is the
/// count of start-type events already recorded for the day. Monotonic,
/// never reused, independent of end/pause events.
pub fn next_session_id(events: &[Event], day_id: &str) -> String {
    let count = events
        .iter()
        .filter(|e| e.kind.is_session_start() && e.session.day_id == day_id)
        .count();
    format!("S{:02}", count + 1)
}

/// Day-level status derived from the log.
#[derive(Debug, Clone, Serialize)]
pub struct DayStatus {
    pub day_id: String,
    pub closed: bool,
    pub closed_at: Option<String>,
    pub active: Vec<SessionView>,
    pub paused: Vec<SessionView>,
    /// Sessions started on this day that never ended. Their presence
    /// blocks day closure.
    pub orphans: Vec<SessionView>,
}

pub fn day_status(events: &[Event], day_id: &str) -> DayStatus {
    let mut closed = false;
    let mut closed_at = None;
    for event in events {
        if let EventKind::DayClosed(p) = &event.kind {
            if event.session.day_id == day_id {
                closed = true;
                closed_at = Some(p.closed_at.clone());
            }
        }
    }

    let index = build_sessions(events);
    let mut active = Vec::new();
    let mut paused = Vec::new();
    let mut orphans = Vec::new();
    for session in index.for_day(day_id) {
        if session.is_open() {
            orphans.push(session.clone());
            if session.is_paused() {
                paused.push(session.clone());
            } else {
                active.push(session.clone());
            }
        }
    }

    DayStatus {
        day_id: day_id.to_string(),
        closed,
        closed_at,
        active,
        paused,
        orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    const DAY: &str = "2026-08-29";

    #[test]
    fn no_events_no_current() {
        let index = build_sessions(&[]);
        assert!(index.current(None).session.is_none());
        assert!(index.active(None).session.is_none());
    }

    #[test]
    fn start_then_end_pairs_leave_no_current() {
        // For all N well-formed start/end pairs, current() is none.
        let mut events = Vec::new();
        for n in 1..=3 {
            let sid = format!("S{n:02}");
            events.push(start(&format!("evt_s{n}"), DAY, &sid, &format!("0{n}:00")));
            events.push(end(&format!("evt_e{n}"), DAY, &sid, &format!("0{n}:30")));
        }
        let index = build_sessions(&events);
        assert!(index.current(None).session.is_none());
        assert!(index.active(None).session.is_none());
    }

    #[test]
    fn open_session_is_current_and_active() {
        let events = vec![start("evt_1", DAY, "S01", "09:00")];
        let index = build_sessions(&events);
        let cur = index.current(None);
        assert_eq!(cur.session.unwrap().session_id, "S01");
        assert!(cur.anomalies.is_empty());
        assert_eq!(index.active(None).session.unwrap().session_id, "S01");
    }

    #[test]
    fn same_label_different_repo_is_a_distinct_session() {
        // A reused S01 label against another repository must not clobber
        // the first session's view.
        let events = vec![
            with_repo(start("evt_1", DAY, "S01", "09:00"), "/repo/a"),
            with_repo(start("evt_2", DAY, "S01", "10:00"), "/repo/b"),
            with_repo(end("evt_3", DAY, "S01", "11:00"), "/repo/a"),
        ];
        let index = build_sessions(&events);
        assert_eq!(index.all().len(), 2);

        // The end landed on the repo-a session only.
        let a = index
            .all()
            .iter()
            .find(|s| s.repo_path() == Some("/repo/a"))
            .unwrap();
        assert!(!a.is_open());
        let b = index.current(Some("/repo/b")).session.unwrap();
        assert_eq!(b.start_ts, format!("{DAY}T10:00:00.000Z"));
        assert!(b.is_open());
        assert!(index.current(Some("/repo/a")).session.is_none());
    }

    #[test]
    fn paused_session_excluded_from_active_only() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            pause("evt_2", DAY, "S01", "09:10"),
        ];
        let index = build_sessions(&events);
        assert_eq!(index.current(None).session.unwrap().session_id, "S01");
        assert!(index.active(None).session.is_none());
    }

    #[test]
    fn resume_after_pause_restores_active() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            pause("evt_2", DAY, "S01", "09:10"),
            resume("evt_3", DAY, "S01", "09:20"),
        ];
        let index = build_sessions(&events);
        assert_eq!(index.active(None).session.unwrap().session_id, "S01");
    }

    #[test]
    fn pause_after_resume_pauses_again() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            pause("evt_2", DAY, "S01", "09:10"),
            resume("evt_3", DAY, "S01", "09:20"),
            pause("evt_4", DAY, "S01", "09:30"),
        ];
        let index = build_sessions(&events);
        assert!(index.active(None).session.is_none());
        assert!(index.current(None).session.unwrap().is_paused());
    }

    #[test]
    fn equal_pause_and_resume_ts_counts_as_paused() {
        let mut p = pause("evt_2", DAY, "S01", "09:10");
        let mut r = resume("evt_3", DAY, "S01", "09:10");
        p.ts = at(DAY, "09:10");
        r.ts = at(DAY, "09:10");
        let events = vec![start("evt_1", DAY, "S01", "09:00"), p, r];
        let index = build_sessions(&events);
        assert!(index.active(None).session.is_none());
    }

    #[test]
    fn ended_session_ignores_later_pause_for_queries() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            end("evt_2", DAY, "S01", "10:00"),
            pause("evt_3", DAY, "S01", "10:05"),
        ];
        let index = build_sessions(&events);
        // Recorded, but the session stays excluded from current/active.
        assert!(index.current(None).session.is_none());
        let view = &index.all()[0];
        assert_eq!(view.last_pause_ts.as_deref(), Some("2026-08-29T10:05:00.000Z"));
    }

    #[test]
    fn force_closed_is_terminal() {
        let mut events = vec![start("evt_1", DAY, "S01", "09:00")];
        events.push(envelope(
            "evt_2",
            &at(DAY, "09:30"),
            worklog_core::EventKind::SessionForceClosed(
                worklog_core::SessionForceClosedPayload {
                    reason: "orphan repair".to_string(),
                },
            ),
            DAY,
            Some("S01"),
        ));
        let index = build_sessions(&events);
        assert!(index.current(None).session.is_none());
        assert!(index.all()[0].forced);
    }

    #[test]
    fn most_recent_open_session_wins() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            end("evt_2", DAY, "S01", "09:30"),
            start("evt_3", DAY, "S02", "10:00"),
            start("evt_4", DAY, "S03", "11:00"),
            end("evt_5", DAY, "S03", "11:30"),
        ];
        let index = build_sessions(&events);
        assert_eq!(index.current(None).session.unwrap().session_id, "S02");
    }

    #[test]
    fn multiple_active_sessions_surface_anomaly_with_best_effort_answer() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            start("evt_2", DAY, "S02", "10:00"),
        ];
        let index = build_sessions(&events);
        let sel = index.active(None);
        assert_eq!(sel.session.as_ref().unwrap().session_id, "S02");
        assert_eq!(sel.anomalies.len(), 1);
        match &sel.anomalies[0] {
            Anomaly::MultipleActive { session_ids } => {
                assert_eq!(session_ids, &["S01".to_string(), "S02".to_string()]);
            }
        }
    }

    #[test]
    fn one_paused_one_active_is_not_an_anomaly() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            pause("evt_2", DAY, "S01", "09:05"),
            start("evt_3", DAY, "S02", "10:00"),
        ];
        let index = build_sessions(&events);
        let sel = index.active(None);
        assert_eq!(sel.session.unwrap().session_id, "S02");
        assert!(sel.anomalies.is_empty());
    }

    #[test]
    fn repo_filter_scopes_queries() {
        let events = vec![
            with_repo(start("evt_1", DAY, "S01", "09:00"), "/repo/a"),
            with_repo(start("evt_2", DAY, "S02", "10:00"), "/repo/b"),
        ];
        let index = build_sessions(&events);
        assert_eq!(
            index.current(Some("/repo/a")).session.unwrap().session_id,
            "S01"
        );
        assert_eq!(
            index.current(Some("/repo/b")).session.unwrap().session_id,
            "S02"
        );
        assert!(index.current(Some("/repo/c")).session.is_none());
        // Unscoped query still reports both as simultaneously active.
        assert_eq!(index.active(None).anomalies.len(), 1);
    }

    #[test]
    fn after_day_closed_start_behaves_identically_with_audit_flag() {
        let mut e = start("evt_1", DAY, "S01", "09:00");
        e.kind = worklog_core::EventKind::SessionStartedAfterDayClosed(
            worklog_core::SessionStartedPayload {
                day_was_closed: true,
            },
        );
        let index = build_sessions(&[e]);
        let sel = index.active(None);
        let view = sel.session.unwrap();
        assert!(view.started_after_close);
        assert_eq!(view.session_id, "S01");
    }

    #[test]
    fn next_session_id_counts_only_start_events_for_the_day() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            end("evt_2", DAY, "S01", "09:30"),
            pause("evt_3", DAY, "S01", "09:15"),
            start("evt_4", "2026-08-28", "S01", "09:00"),
        ];
        assert_eq!(next_session_id(&events, DAY), "S02");
        assert_eq!(next_session_id(&events, "2026-08-28"), "S02");
        assert_eq!(next_session_id(&events, "2026-08-30"), "S01");
    }

    #[test]
    fn next_session_id_counts_after_day_closed_variant() {
        let mut e = start("evt_1", DAY, "S01", "09:00");
        e.kind = worklog_core::EventKind::SessionStartedAfterDayClosed(Default::default());
        assert_eq!(next_session_id(&[e], DAY), "S02");
    }

    #[test]
    fn day_status_reports_orphans_and_closure() {
        let events = vec![start("evt_1", DAY, "S01", "09:00")];
        let status = day_status(&events, DAY);
        assert!(!status.closed);
        assert_eq!(status.orphans.len(), 1);
        assert_eq!(status.orphans[0].session_id, "S01");
        assert_eq!(status.active.len(), 1);
        assert!(status.paused.is_empty());
    }

    #[test]
    fn day_status_closed_with_no_orphans() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            end("evt_2", DAY, "S01", "09:30"),
            day_closed("evt_3", DAY, "18:00"),
        ];
        let status = day_status(&events, DAY);
        assert!(status.closed);
        assert_eq!(status.closed_at.as_deref(), Some("2026-08-29T18:00:00.000Z"));
        assert!(status.orphans.is_empty());
    }

    #[test]
    fn orphan_detection_scoped_to_the_day() {
        let events = vec![
            start("evt_1", "2026-08-28", "S01", "09:00"),
            start("evt_2", DAY, "S01", "09:00"),
            end("evt_3", DAY, "S01", "10:00"),
        ];
        // Yesterday's orphan does not block today.
        assert!(day_status(&events, DAY).orphans.is_empty());
        assert_eq!(day_status(&events, "2026-08-28").orphans.len(), 1);
    }

    #[test]
    fn paused_open_session_is_still_an_orphan() {
        let events = vec![
            start("evt_1", DAY, "S01", "09:00"),
            pause("evt_2", DAY, "S01", "09:10"),
        ];
        let status = day_status(&events, DAY);
        assert_eq!(status.orphans.len(), 1);
        assert_eq!(status.paused.len(), 1);
        assert!(status.active.is_empty());
    }

    #[test]
    fn same_session_id_on_different_days_are_distinct() {
        let events = vec![
            start("evt_1", "2026-08-28", "S01", "09:00"),
            end("evt_2", "2026-08-28", "S01", "17:00"),
            start("evt_3", DAY, "S01", "09:00"),
        ];
        let index = build_sessions(&events);
        assert_eq!(index.all().len(), 2);
        let cur = index.current(None).session.unwrap();
        assert_eq!(cur.day_id, DAY);
    }
}
