use anyhow::bail;
use std::path::Path;

use worklog_core::event::{new_event, new_fix_id, EventMeta};
use worklog_core::{EventKind, FixCommittedPayload, FixLinkedPayload, SessionRef};
use worklog_derive::{commit_binding, find_capture, find_fix, latest_unfixed};
use worklog_ledger::Ledger;

/// `worklog fix`: bind a new fix to a capture.
pub fn link(
    data_root: &Path,
    from_capture: Option<&str>,
    title: Option<&str>,
    sha: Option<&str>,
) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;

    let capture = match from_capture {
        Some(needle) => match find_capture(&replay.events, needle) {
            Some(c) => c,
            None => bail!("capture {needle} not found. See `worklog log --type CaptureCreated`."),
        },
        None => match latest_unfixed(&replay.events) {
            Some(c) => c,
            None => bail!("no unfixed captures."),
        },
    };

    let fix_id = new_fix_id();
    let payload = FixLinkedPayload {
        fix_id: fix_id.clone(),
        error_event_id: capture.event_id.clone(),
        error_hash: capture.error_hash.clone(),
        fix_sha: sha.map(|s| s.to_string()),
        title: title.unwrap_or(&capture.title).to_string(),
    };
    let event = new_event(
        EventKind::FixLinked(payload),
        EventMeta {
            session: Some(SessionRef::scoped(
                capture.day_id.clone(),
                capture.session_id.clone(),
            )),
            ..Default::default()
        },
    );
    ledger.append(&event)?;
    println!("Linked {fix_id} to capture {} ({})", capture.event_id, capture.title);
    Ok(())
}

/// `worklog fix-commit`: bind a fix to a revision. Idempotent, re-running
/// reports the existing binding and succeeds.
pub fn commit(data_root: &Path, fix_id: Option<&str>, commit: Option<&str>) -> anyhow::Result<()> {
    let repo_dir = std::env::current_dir()?;
    commit_in(data_root, &repo_dir, fix_id, commit)
}

fn commit_in(
    data_root: &Path,
    repo_dir: &Path,
    fix_id: Option<&str>,
    commit: Option<&str>,
) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;

    let (fix_event_id, fix) = match fix_id {
        Some(id) => match find_fix(&replay.events, id) {
            Some(found) => found,
            None => bail!("fix {id} not found."),
        },
        None => {
            let latest = replay.events.iter().rev().find_map(|e| match &e.kind {
                EventKind::FixLinked(p) => Some((e.event_id.clone(), p.clone())),
                _ => None,
            });
            match latest {
                Some(found) => found,
                None => bail!("no fix to bind. Link one first with `worklog fix`."),
            }
        }
    };

    if let Some(existing) = commit_binding(&replay.events, &fix.fix_id) {
        println!(
            "Fix {} already bound to commit {}",
            fix.fix_id, existing.commit_sha
        );
        return Ok(());
    }

    let commit_sha = match commit {
        Some(sha) => {
            // Outside a repository the sha may reference another clone and
            // is taken as-is; inside one it must resolve.
            if worklog_git::is_git_repo(repo_dir) && !worklog_git::rev_exists(repo_dir, sha) {
                bail!("revision {sha} does not exist in {}", repo_dir.display());
            }
            sha.to_string()
        }
        None => {
            if !worklog_git::is_git_repo(repo_dir) {
                bail!(
                    "{} is not a git repository; pass --commit <sha>.",
                    repo_dir.display()
                );
            }
            match worklog_git::head_sha(repo_dir)? {
                Some(sha) => sha,
                None => bail!("repository has no commits yet; pass --commit <sha>."),
            }
        }
    };

    let event = new_event(
        EventKind::FixCommitted(FixCommittedPayload {
            fix_id: fix.fix_id.clone(),
            fix_event_id,
            error_event_id: fix.error_event_id.clone(),
            commit_sha: commit_sha.clone(),
        }),
        EventMeta::default(),
    );
    ledger.append(&event)?;
    println!("Bound fix {} to commit {commit_sha}", fix.fix_id);
    Ok(())
}
