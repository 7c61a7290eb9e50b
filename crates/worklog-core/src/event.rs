use crate::clock;
use crate::types::{Actor, Event, EventKind, Link, Project, RepoSnapshot, SessionRef};

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", ulid::Ulid::new().to_string().to_lowercase())
}

pub fn new_event_id() -> String {
    new_id("evt")
}

pub fn new_capture_id() -> String {
    new_id("cap")
}

pub fn new_fix_id() -> String {
    new_id("fix")
}

/// Envelope fields shared by every event variant.
#[derive(Debug, Clone, Default)]
pub struct EventMeta {
    pub session: Option<SessionRef>,
    pub actor: Actor,
    pub project: Project,
    pub repo: Option<RepoSnapshot>,
    pub links: Vec<Link>,
}

/// Build a new event with a fresh id and the current timestamp.
/// When `meta.session` is omitted the event is scoped to the current day.
pub fn new_event(kind: EventKind, meta: EventMeta) -> Event {
    let session = meta
        .session
        .unwrap_or_else(|| SessionRef::scoped(clock::today(), None));
    Event {
        event_id: new_event_id(),
        ts: clock::now_ts(),
        kind,
        session,
        actor: meta.actor,
        project: meta.project,
        repo: meta.repo,
        links: meta.links,
    }
}
