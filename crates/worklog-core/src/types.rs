use serde::{Deserialize, Serialize};

/// Event ID format: `evt_<ulid>`
pub type EventId = String;

/// Calendar-date key, `YYYY-MM-DD` (UTC).
pub type DayId = String;

/// Session scope carried by every event. `session_id` is a per-day
/// sequential label (`S01`, `S02`, ...); day-level events carry `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRef {
    pub day_id: DayId,
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl SessionRef {
    /// Bare scope with no intent/mode decoration.
    pub fn scoped(day_id: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            day_id: day_id.into(),
            session_id,
            intent: None,
            dod: None,
            mode: None,
            result: None,
        }
    }
}

/// Attribution metadata, not interpreted by the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub user_type: String,
    pub role: String,
    pub client: String,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            user_id: "u_local".to_string(),
            user_type: "human".to_string(),
            role: "dev".to_string(),
            client: "cli".to_string(),
        }
    }
}

/// Project attribution metadata, not interpreted by the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub context: String,
}

/// Point-in-time repository snapshot — a value, never a live handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoSnapshot {
    pub path: String,
    pub vcs: String,
    pub branch: String,
    pub start_sha: Option<String>,
    pub end_sha: Option<String>,
    pub dirty: bool,
}

/// Opaque pointer to an external artifact (diff, capture text, summary
/// document). The core passes these through without dereferencing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub kind: String,
    #[serde(rename = "ref")]
    pub target: String,
}

impl Link {
    pub fn artifact(target: impl Into<String>) -> Self {
        Self {
            kind: "artifact".to_string(),
            target: target.into(),
        }
    }
}

// ── Event payloads ──

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionStartedPayload {
    #[serde(default)]
    pub day_was_closed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionEndedPayload {
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub duration_min: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionForceClosedPayload {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionPausedPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionResumedPayload {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DayClosedPayload {
    pub closed_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepoBaselinePayload {
    #[serde(default)]
    pub status_porcelain: String,
    #[serde(default)]
    pub tracked_files: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepoDiffPayload {
    #[serde(default)]
    pub files_changed: usize,
    #[serde(default)]
    pub commits: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleanupPayload {
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Reference from a commit suggestion back to the unfixed capture it
/// resolves, when one exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRef {
    pub error_event_id: EventId,
    pub error_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommitSuggestionPayload {
    pub command: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_ref: Option<ErrorRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommitOverduePayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaptureCreatedPayload {
    pub kind: String,
    pub title: String,
    pub error_hash: String,
    pub artifact_ref: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaptureReoccurredPayload {
    pub title: String,
    pub error_hash: String,
    /// The first capture event recorded with this hash.
    pub original_event_id: EventId,
    pub artifact_ref: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FixLinkedPayload {
    pub fix_id: String,
    pub error_event_id: EventId,
    pub error_hash: String,
    /// Resolving revision if already committed, `None` while pending.
    #[serde(default)]
    pub fix_sha: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FixCommittedPayload {
    pub fix_id: String,
    pub fix_event_id: EventId,
    pub error_event_id: EventId,
    pub commit_sha: String,
}

/// Day-progress assessment category, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assessment {
    #[serde(rename = "ON_TRACK")]
    OnTrack,
    #[serde(rename = "OFF_TRACK")]
    OffTrack,
    #[serde(rename = "BLOCKED")]
    Blocked,
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Assessment::OnTrack => "ON_TRACK",
            Assessment::OffTrack => "OFF_TRACK",
            Assessment::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Rolling,
    Nightly,
}

impl std::fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryMode::Rolling => f.write_str("rolling"),
            SummaryMode::Nightly => f.write_str("nightly"),
        }
    }
}

/// What changed since the prior rolling summary of the same day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Delta {
    pub new_events: usize,
    pub new_commit_suggestions: usize,
    pub new_captures: usize,
    pub assessment_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryPayload {
    pub day_id: DayId,
    pub mode: SummaryMode,
    pub window_start: String,
    pub window_end: String,
    pub summary_version: String,
    pub assessment: Assessment,
    pub next_step: String,
    #[serde(default)]
    pub blocker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,
    pub delta: Delta,
    #[serde(default)]
    pub objective: String,
    pub artifact_ref: String,
}

// ── Event kind (closed enumeration) ──

/// One variant per event type; the serde representation puts the variant
/// name in `type` and the payload struct in `payload`, flattened into the
/// envelope so one NDJSON line reads `{"event_id":..,"type":..,"payload":..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum EventKind {
    SessionStarted(SessionStartedPayload),
    SessionStartedAfterDayClosed(SessionStartedPayload),
    SessionEnded(SessionEndedPayload),
    SessionForceClosed(SessionForceClosedPayload),
    SessionPaused(SessionPausedPayload),
    SessionResumed(SessionResumedPayload),
    DayClosed(DayClosedPayload),
    RepoBaselineCaptured(RepoBaselinePayload),
    RepoDiffComputed(RepoDiffPayload),
    CleanupTaskGenerated(CleanupPayload),
    CommitSuggestionIssued(CommitSuggestionPayload),
    CommitOverdue(CommitOverduePayload),
    CaptureCreated(CaptureCreatedPayload),
    CaptureReoccurred(CaptureReoccurredPayload),
    FixLinked(FixLinkedPayload),
    FixCommitted(FixCommittedPayload),
    RollingSummaryGenerated(SummaryPayload),
    DailySummaryGenerated(SummaryPayload),
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::SessionStarted(_) => "SessionStarted",
            EventKind::SessionStartedAfterDayClosed(_) => "SessionStartedAfterDayClosed",
            EventKind::SessionEnded(_) => "SessionEnded",
            EventKind::SessionForceClosed(_) => "SessionForceClosed",
            EventKind::SessionPaused(_) => "SessionPaused",
            EventKind::SessionResumed(_) => "SessionResumed",
            EventKind::DayClosed(_) => "DayClosed",
            EventKind::RepoBaselineCaptured(_) => "RepoBaselineCaptured",
            EventKind::RepoDiffComputed(_) => "RepoDiffComputed",
            EventKind::CleanupTaskGenerated(_) => "CleanupTaskGenerated",
            EventKind::CommitSuggestionIssued(_) => "CommitSuggestionIssued",
            EventKind::CommitOverdue(_) => "CommitOverdue",
            EventKind::CaptureCreated(_) => "CaptureCreated",
            EventKind::CaptureReoccurred(_) => "CaptureReoccurred",
            EventKind::FixLinked(_) => "FixLinked",
            EventKind::FixCommitted(_) => "FixCommitted",
            EventKind::RollingSummaryGenerated(_) => "RollingSummaryGenerated",
            EventKind::DailySummaryGenerated(_) => "DailySummaryGenerated",
        }
    }

    /// Start-type events enter the `STARTED` state; the after-day-closed
    /// variant differs only by an audit flag.
    pub fn is_session_start(&self) -> bool {
        matches!(
            self,
            EventKind::SessionStarted(_) | EventKind::SessionStartedAfterDayClosed(_)
        )
    }

    /// Terminal lifecycle transitions — `ENDED` or `FORCE_CLOSED`.
    pub fn is_session_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::SessionEnded(_) | EventKind::SessionForceClosed(_)
        )
    }

    /// Session lifecycle transitions mirrored into the sessions projection.
    pub fn is_lifecycle(&self) -> bool {
        self.is_session_start()
            || self.is_session_terminal()
            || matches!(
                self,
                EventKind::SessionPaused(_) | EventKind::SessionResumed(_)
            )
    }

    pub fn is_capture(&self) -> bool {
        matches!(
            self,
            EventKind::CaptureCreated(_) | EventKind::CaptureReoccurred(_)
        )
    }

    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            EventKind::RollingSummaryGenerated(_) | EventKind::DailySummaryGenerated(_)
        )
    }
}

/// A single log event (one NDJSON line in `events.ndjson`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub event_id: EventId,
    pub ts: String,
    #[serde(flatten)]
    pub kind: EventKind,
    pub session: SessionRef,
    pub actor: Actor,
    pub project: Project,
    #[serde(default)]
    pub repo: Option<RepoSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Event {
    pub fn day_id(&self) -> &str {
        &self.session.day_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn repo_path(&self) -> Option<&str> {
        self.repo.as_ref().map(|r| r.path.as_str())
    }
}
