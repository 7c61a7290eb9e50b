use anyhow::bail;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use worklog_core::event::{new_event, EventMeta};
use worklog_core::{
    clock, CleanupPayload, EventKind, Link, Project, RepoBaselinePayload, RepoDiffPayload,
    SessionEndedPayload, SessionForceClosedPayload, SessionPausedPayload, SessionRef,
    SessionStartedPayload,
};
use worklog_derive::{build_sessions, day_status, next_session_id, Selection};
use worklog_ledger::Ledger;
use worklog_summary::append_journal_entry;

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a session against a git repository
    Start {
        /// What this session is for
        #[arg(long)]
        intent: Option<String>,
        /// Definition of done
        #[arg(long)]
        dod: Option<String>,
        /// Working mode label (deep, review, firefight, ...)
        #[arg(long)]
        mode: Option<String>,
        /// Repository path (default: current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "")]
        area: String,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// End the current session
    End {
        /// Outcome note recorded on the session
        #[arg(long)]
        result: Option<String>,
    },
    /// Pause the current session
    Pause {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Resume the paused session
    Resume,
    /// Force-close an open session by id
    Close {
        session_id: String,
        #[arg(long, default_value = "orphan cleanup")]
        reason: String,
    },
}

pub fn run(cmd: SessionCmd, data_root: &Path) -> anyhow::Result<()> {
    match cmd {
        SessionCmd::Start {
            intent,
            dod,
            mode,
            repo,
            tag,
            area,
            context,
        } => start(
            data_root,
            StartArgs {
                intent,
                dod,
                mode,
                repo,
                tag,
                area,
                context,
            },
        ),
        SessionCmd::End { result } => end(data_root, result.as_deref()),
        SessionCmd::Pause { reason } => pause(data_root, reason),
        SessionCmd::Resume => resume(data_root),
        SessionCmd::Close { session_id, reason } => close(data_root, &session_id, &reason),
    }
}

pub struct StartArgs {
    pub intent: Option<String>,
    pub dod: Option<String>,
    pub mode: Option<String>,
    pub repo: Option<PathBuf>,
    pub tag: Option<String>,
    pub area: String,
    pub context: String,
}

fn print_anomalies(selection: &Selection) {
    for anomaly in &selection.anomalies {
        eprintln!("warning: {anomaly}");
    }
}

pub fn start(data_root: &Path, args: StartArgs) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;

    let repo_dir = match args.repo {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    let snapshot = if worklog_git::is_git_repo(&repo_dir) {
        Some(worklog_git::snapshot(&repo_dir)?)
    } else {
        eprintln!(
            "warning: {} is not a git repository; starting an untracked session",
            repo_dir.display()
        );
        None
    };

    let index = build_sessions(&replay.events);
    let selection = index.active(snapshot.as_ref().map(|s| s.path.as_str()));
    print_anomalies(&selection);
    if let Some(active) = selection.session {
        bail!(
            "session {} is already active (started {}). End it with `worklog session end`.",
            active.session_id,
            active.start_ts
        );
    }

    let day = clock::today();
    let day_was_closed = day_status(&replay.events, &day).closed;
    let sid = next_session_id(&replay.events, &day);

    let mut session = SessionRef::scoped(day.clone(), Some(sid.clone()));
    session.intent = args.intent;
    session.dod = args.dod;
    session.mode = args.mode;
    let project = Project {
        tag: args.tag,
        area: args.area,
        context: args.context,
    };

    let kind = if day_was_closed {
        eprintln!("note: day {day} was already closed; recording a post-close session");
        EventKind::SessionStartedAfterDayClosed(SessionStartedPayload {
            day_was_closed: true,
        })
    } else {
        EventKind::SessionStarted(SessionStartedPayload {
            day_was_closed: false,
        })
    };
    let event = new_event(
        kind,
        EventMeta {
            session: Some(session.clone()),
            project: project.clone(),
            repo: snapshot.clone(),
            ..Default::default()
        },
    );
    ledger.append(&event)?;

    if let Some(snap) = &snapshot {
        let repo_path = Path::new(&snap.path);
        let porcelain = worklog_git::status_porcelain(repo_path)?;
        let tracked = worklog_git::tracked_files_count(repo_path)?;
        let mut links = Vec::new();
        if snap.dirty {
            let base = worklog_git::diff_base(repo_path)?;
            let patch = worklog_git::diff_working(repo_path, &base)?;
            std::fs::write(ledger.paths.diff_artifact(&sid, "start"), patch)?;
            links.push(Link::artifact(format!(
                "artifacts/{sid}_repo_diff_start.patch"
            )));
            eprintln!("note: repository is dirty; baseline diff saved");
        }
        let baseline = new_event(
            EventKind::RepoBaselineCaptured(RepoBaselinePayload {
                status_porcelain: porcelain,
                tracked_files: tracked,
            }),
            EventMeta {
                session: Some(session.clone()),
                project,
                repo: snapshot.clone(),
                links,
                ..Default::default()
            },
        );
        ledger.append(&baseline)?;
    }

    append_journal_entry(
        &ledger.paths.journal_file(&day),
        &day,
        &event.ts,
        &format!("session {sid} started"),
    )?;
    println!("Started session {sid} ({day})");
    Ok(())
}

/// Stray files worth flagging when a session's diff touches them.
fn cleanup_tasks(files: &[String]) -> Vec<String> {
    const STRAY_SUFFIXES: &[&str] = &[".tmp", ".bak", ".orig", ".rej", ".swp"];
    let mut tasks = Vec::new();
    for file in files {
        if STRAY_SUFFIXES.iter().any(|s| file.ends_with(s)) {
            tasks.push(format!("remove stray file {file}"));
        } else if file.ends_with(".log") {
            tasks.push(format!("avoid committing log file {file}"));
        }
    }
    tasks
}

pub fn end(data_root: &Path, result: Option<&str>) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let selection = build_sessions(&replay.events).current(None);
    print_anomalies(&selection);
    let Some(view) = selection.session else {
        bail!("no open session. Start one with `worklog session start`.");
    };
    let sid = view.session_id.clone();
    let day = view.day_id.clone();

    let mut session = SessionRef::scoped(day.clone(), Some(sid.clone()));
    session.result = result.map(|s| s.to_string());

    let mut repo_snapshot = view.repo.clone();
    if let Some(snap) = &mut repo_snapshot {
        let repo_path = PathBuf::from(&snap.path);
        if worklog_git::is_git_repo(&repo_path) {
            let head = worklog_git::head_sha(&repo_path)?;
            snap.end_sha = head.clone();
            snap.dirty = worklog_git::is_dirty(&repo_path)?;

            let committed_range = match (&snap.start_sha, &head) {
                (Some(start), Some(end)) => {
                    start != end && worklog_git::rev_exists(&repo_path, start)
                }
                _ => false,
            };
            let (files, commits, patch) = if committed_range {
                let start = snap.start_sha.as_deref().unwrap_or_default();
                let end = head.as_deref().unwrap_or_default();
                (
                    worklog_git::changed_files(&repo_path, start, end)?,
                    worklog_git::commit_count(&repo_path, start, end)?,
                    worklog_git::diff(&repo_path, start, end)?,
                )
            } else {
                let base = snap
                    .start_sha
                    .clone()
                    .unwrap_or_else(|| worklog_git::EMPTY_TREE_SHA.to_string());
                (
                    worklog_git::changed_files_working(&repo_path)?,
                    0,
                    worklog_git::diff_working(&repo_path, &base)?,
                )
            };

            let mut links = Vec::new();
            if !patch.is_empty() {
                std::fs::write(ledger.paths.diff_artifact(&sid, "end"), patch)?;
                links.push(Link::artifact(format!(
                    "artifacts/{sid}_repo_diff_end.patch"
                )));
            }
            let diff_event = new_event(
                EventKind::RepoDiffComputed(RepoDiffPayload {
                    files_changed: files.len(),
                    commits,
                }),
                EventMeta {
                    session: Some(session.clone()),
                    repo: Some(snap.clone()),
                    links,
                    ..Default::default()
                },
            );
            ledger.append(&diff_event)?;

            let tasks = cleanup_tasks(&files);
            if !tasks.is_empty() {
                for task in &tasks {
                    eprintln!("cleanup: {task}");
                }
                let cleanup = new_event(
                    EventKind::CleanupTaskGenerated(CleanupPayload { tasks }),
                    EventMeta {
                        session: Some(session.clone()),
                        ..Default::default()
                    },
                );
                ledger.append(&cleanup)?;
            }
        }
    }

    let event = new_event(
        EventKind::SessionEnded(SessionEndedPayload {
            forced: false,
            duration_min: clock::minutes_between(&view.start_ts, &clock::now_ts()),
        }),
        EventMeta {
            session: Some(session),
            repo: repo_snapshot,
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    append_journal_entry(
        &ledger.paths.journal_file(&day),
        &day,
        &event.ts,
        &format!("session {sid} ended"),
    )?;
    println!("Ended session {sid}");
    Ok(())
}

pub fn pause(data_root: &Path, reason: Option<String>) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let selection = build_sessions(&replay.events).current(None);
    print_anomalies(&selection);
    let Some(view) = selection.session else {
        bail!("no open session to pause.");
    };
    if view.is_paused() {
        bail!("session {} is already paused.", view.session_id);
    }
    let session = SessionRef::scoped(view.day_id.clone(), Some(view.session_id.clone()));
    let event = new_event(
        EventKind::SessionPaused(SessionPausedPayload { reason }),
        EventMeta {
            session: Some(session),
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    append_journal_entry(
        &ledger.paths.journal_file(&view.day_id),
        &view.day_id,
        &event.ts,
        &format!("session {} paused", view.session_id),
    )?;
    println!("Paused session {}", view.session_id);
    Ok(())
}

pub fn resume(data_root: &Path) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let selection = build_sessions(&replay.events).current(None);
    print_anomalies(&selection);
    let Some(view) = selection.session else {
        bail!("no open session to resume.");
    };
    if !view.is_paused() {
        bail!("session {} is not paused.", view.session_id);
    }
    let session = SessionRef::scoped(view.day_id.clone(), Some(view.session_id.clone()));
    let event = new_event(
        EventKind::SessionResumed(Default::default()),
        EventMeta {
            session: Some(session),
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    append_journal_entry(
        &ledger.paths.journal_file(&view.day_id),
        &view.day_id,
        &event.ts,
        &format!("session {} resumed", view.session_id),
    )?;
    println!("Resumed session {}", view.session_id);
    Ok(())
}

pub fn close(data_root: &Path, session_id: &str, reason: &str) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    let index = build_sessions(&replay.events);
    let Some(view) = index
        .all()
        .iter()
        .rev()
        .find(|s| s.session_id == session_id && s.is_open())
        .cloned()
    else {
        bail!("no open session {session_id}. See `worklog day status` for orphans.");
    };

    let session = SessionRef::scoped(view.day_id.clone(), Some(view.session_id.clone()));
    let forced = new_event(
        EventKind::SessionForceClosed(SessionForceClosedPayload {
            reason: reason.to_string(),
        }),
        EventMeta {
            session: Some(session.clone()),
            ..Default::default()
        },
    );
    ledger.append(&forced)?;
    append_journal_entry(
        &ledger.paths.journal_file(&view.day_id),
        &view.day_id,
        &forced.ts,
        &format!("session {} force-closed ({reason})", view.session_id),
    )?;
    println!("Force-closed session {} ({})", view.session_id, view.day_id);
    Ok(())
}
