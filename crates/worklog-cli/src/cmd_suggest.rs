use anyhow::bail;
use std::path::Path;

use worklog_core::event::{new_event, EventMeta};
use worklog_core::{CommitSuggestionPayload, ErrorRef, EventKind, SessionRef};
use worklog_derive::{build_sessions, latest_unfixed};
use worklog_ledger::Ledger;

/// `worklog suggest`: look at the working tree and propose a commit command.
pub fn execute(data_root: &Path) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let repo_dir = std::env::current_dir()?;
    if !worklog_git::is_git_repo(&repo_dir) {
        bail!("{} is not a git repository.", repo_dir.display());
    }

    let files = worklog_git::changed_files_working(&repo_dir)?;
    if files.is_empty() {
        println!("nothing to commit.");
        return Ok(());
    }

    let replay = ledger.read_all()?;
    let unfixed = latest_unfixed(&replay.events);

    let (message, error_ref) = match &unfixed {
        Some(capture) => (
            format!("fix: {}", capture.title),
            Some(ErrorRef {
                error_event_id: capture.event_id.clone(),
                error_hash: capture.error_hash.clone(),
            }),
        ),
        None => (file_summary_message(&files), None),
    };
    let command = format!("git commit -am \"{}\"", message.replace('"', "'"));

    let index = build_sessions(&replay.events);
    let selection = index.current(None);
    for anomaly in &selection.anomalies {
        eprintln!("warning: {anomaly}");
    }
    let session = selection
        .session
        .map(|s| SessionRef::scoped(s.day_id.clone(), Some(s.session_id.clone())));

    let event = new_event(
        EventKind::CommitSuggestionIssued(CommitSuggestionPayload {
            command: command.clone(),
            files,
            error_ref,
        }),
        EventMeta {
            session,
            ..Default::default()
        },
    );
    ledger.append(&event)?;

    println!("{command}");
    Ok(())
}

fn file_summary_message(files: &[String]) -> String {
    let docs_only = files.iter().all(|f| f.ends_with(".md"));
    let prefix = if docs_only { "docs" } else { "chore" };
    let first = files.first().map(String::as_str).unwrap_or("changes");
    if files.len() > 1 {
        format!("{prefix}: update {first} and {} more", files.len() - 1)
    } else {
        format!("{prefix}: update {first}")
    }
}
