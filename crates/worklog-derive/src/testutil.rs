//! Builders for hand-rolled event sequences with explicit timestamps.

use worklog_core::*;

pub fn at(day: &str, hhmm: &str) -> String {
    format!("{day}T{hhmm}:00.000Z")
}

pub fn envelope(
    id: &str,
    ts: &str,
    kind: EventKind,
    day: &str,
    session_id: Option<&str>,
) -> Event {
    Event {
        event_id: id.to_string(),
        ts: ts.to_string(),
        kind,
        session: SessionRef::scoped(day, session_id.map(|s| s.to_string())),
        actor: Actor::default(),
        project: Project::default(),
        repo: None,
        links: Vec::new(),
    }
}

pub fn with_repo(mut event: Event, repo_path: &str) -> Event {
    event.repo = Some(RepoSnapshot {
        path: repo_path.to_string(),
        vcs: "git".to_string(),
        branch: "main".to_string(),
        start_sha: None,
        end_sha: None,
        dirty: false,
    });
    event
}

pub fn start(id: &str, day: &str, sid: &str, hhmm: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::SessionStarted(SessionStartedPayload::default()),
        day,
        Some(sid),
    )
}

pub fn end(id: &str, day: &str, sid: &str, hhmm: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::SessionEnded(SessionEndedPayload::default()),
        day,
        Some(sid),
    )
}

pub fn pause(id: &str, day: &str, sid: &str, hhmm: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::SessionPaused(SessionPausedPayload::default()),
        day,
        Some(sid),
    )
}

pub fn resume(id: &str, day: &str, sid: &str, hhmm: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::SessionResumed(SessionResumedPayload::default()),
        day,
        Some(sid),
    )
}

pub fn capture(id: &str, day: &str, sid: &str, hhmm: &str, hash: &str, title: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::CaptureCreated(CaptureCreatedPayload {
            kind: "error".to_string(),
            title: title.to_string(),
            error_hash: hash.to_string(),
            artifact_ref: format!("artifacts/captures/{day}/{sid}/{id}.txt"),
        }),
        day,
        Some(sid),
    )
}

pub fn reoccurred(
    id: &str,
    day: &str,
    sid: &str,
    hhmm: &str,
    hash: &str,
    original: &str,
) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::CaptureReoccurred(CaptureReoccurredPayload {
            title: "again".to_string(),
            error_hash: hash.to_string(),
            original_event_id: original.to_string(),
            artifact_ref: format!("artifacts/captures/{day}/{sid}/{id}.txt"),
        }),
        day,
        Some(sid),
    )
}

pub fn fix(id: &str, day: &str, sid: &str, hhmm: &str, fix_id: &str, error_event: &str) -> Event {
    envelope(
        id,
        &at(day, hhmm),
        EventKind::FixLinked(FixLinkedPayload {
            fix_id: fix_id.to_string(),
            error_event_id: error_event.to_string(),
            error_hash: "h".to_string(),
            fix_sha: None,
            title: "fix".to_string(),
        }),
        day,
        Some(sid),
    )
}

pub fn day_closed(id: &str, day: &str, hhmm: &str) -> Event {
    let ts = at(day, hhmm);
    envelope(
        id,
        &ts,
        EventKind::DayClosed(DayClosedPayload { closed_at: ts.clone() }),
        day,
        None,
    )
}
