//! Git subprocess collaborator. Pure queries only; nothing here mutates
//! a repository. Every function shells out to the `git` binary and parses
//! its output, so callers must treat results as point-in-time snapshots.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use worklog_core::RepoSnapshot;

/// SHA of git's well-known empty tree, usable as a diff base in a repo
/// with no commits yet.
pub const EMPTY_TREE_SHA: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .with_context(|| format!("failed to spawn git {}", args.join(" ")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn is_git_repo(repo: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(repo)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// HEAD revision, `None` in a repository with no commits yet.
pub fn head_sha(repo: &Path) -> Result<Option<String>> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo)
        .output()
        .context("failed to spawn git rev-parse")?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(Some(
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
    ))
}

pub fn current_branch(repo: &Path) -> Result<String> {
    let out = run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(out.trim().to_string())
}

pub fn status_porcelain(repo: &Path) -> Result<String> {
    run_git(repo, &["status", "--porcelain"])
}

pub fn is_dirty(repo: &Path) -> Result<bool> {
    Ok(!status_porcelain(repo)?.trim().is_empty())
}

/// Full textual diff between two revisions.
pub fn diff(repo: &Path, from: &str, to: &str) -> Result<String> {
    run_git(repo, &["diff", from, to])
}

/// Diff of the working tree against a base revision, staged and unstaged
/// changes included.
pub fn diff_working(repo: &Path, base: &str) -> Result<String> {
    run_git(repo, &["diff", base])
}

/// Paths changed between two revisions.
pub fn changed_files(repo: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let out = run_git(repo, &["diff", "--name-only", from, to])?;
    Ok(out.lines().map(|l| l.to_string()).collect())
}

/// Paths with uncommitted changes, untracked files included.
pub fn changed_files_working(repo: &Path) -> Result<Vec<String>> {
    let out = status_porcelain(repo)?;
    Ok(out
        .lines()
        .filter(|l| l.len() > 3)
        .map(|l| l[3..].trim().to_string())
        .collect())
}

pub fn log_oneline(repo: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let range = format!("{from}..{to}");
    let out = run_git(repo, &["log", "--oneline", &range])?;
    Ok(out.lines().map(|l| l.to_string()).collect())
}

pub fn commit_count(repo: &Path, from: &str, to: &str) -> Result<usize> {
    Ok(log_oneline(repo, from, to)?.len())
}

pub fn tracked_files_count(repo: &Path) -> Result<usize> {
    let out = run_git(repo, &["ls-files"])?;
    Ok(out.lines().count())
}

pub fn rev_exists(repo: &Path, rev: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")])
        .current_dir(repo)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Point-in-time snapshot for the event envelope. `start_sha` is the
/// current HEAD; `end_sha` stays empty until session end fills it in.
pub fn snapshot(repo: &Path) -> Result<RepoSnapshot> {
    if !is_git_repo(repo) {
        bail!(
            "{} is not a git repository. Run from inside a repo or pass --repo.",
            repo.display()
        );
    }
    let head = head_sha(repo)?;
    let branch = if head.is_some() {
        current_branch(repo)?
    } else {
        // No commits yet, rev-parse HEAD has nothing to abbreviate.
        "HEAD".to_string()
    };
    Ok(RepoSnapshot {
        path: repo
            .canonicalize()
            .unwrap_or_else(|_| repo.to_path_buf())
            .to_string_lossy()
            .into_owned(),
        vcs: "git".to_string(),
        branch,
        start_sha: head,
        end_sha: None,
        dirty: is_dirty(repo)?,
    })
}

/// Base revision for diffing: HEAD when it exists, the empty tree in a
/// repo with no commits.
pub fn diff_base(repo: &Path) -> Result<String> {
    Ok(head_sha(repo)?.unwrap_or_else(|| EMPTY_TREE_SHA.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git(dir: &Path, args: &[&str]) {
        let out = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(out.status.success(), "git {args:?} failed");
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init", "-b", "main"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
    }

    fn commit_file(dir: &Path, name: &str, body: &str, msg: &str) {
        std::fs::write(dir.join(name), body).unwrap();
        git(dir, &["add", "."]);
        git(dir, &["commit", "-m", msg]);
    }

    #[test]
    fn detects_repo_and_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()));
        init_repo(dir.path());
        assert!(is_git_repo(dir.path()));
    }

    #[test]
    fn head_sha_none_before_first_commit() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        assert!(head_sha(dir.path()).unwrap().is_none());
        commit_file(dir.path(), "a.txt", "a", "init");
        assert!(head_sha(dir.path()).unwrap().is_some());
    }

    #[test]
    fn snapshot_of_empty_repo_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let snap = snapshot(dir.path()).unwrap();
        assert!(snap.start_sha.is_none());
        assert!(!snap.dirty);
        assert_eq!(diff_base(dir.path()).unwrap(), EMPTY_TREE_SHA);
    }

    #[test]
    fn snapshot_reports_branch_dirty_and_head() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "init");
        let clean = snapshot(dir.path()).unwrap();
        assert_eq!(clean.branch, "main");
        assert!(!clean.dirty);

        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        let dirty = snapshot(dir.path()).unwrap();
        assert!(dirty.dirty);
        assert_eq!(dirty.start_sha, clean.start_sha);
    }

    #[test]
    fn snapshot_outside_a_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(snapshot(dir.path()).is_err());
    }

    #[test]
    fn changed_files_between_commits() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "first");
        let base = head_sha(dir.path()).unwrap().unwrap();
        commit_file(dir.path(), "b.txt", "b", "second");
        let head = head_sha(dir.path()).unwrap().unwrap();

        let files = changed_files(dir.path(), &base, &head).unwrap();
        assert_eq!(files, vec!["b.txt".to_string()]);
        assert_eq!(commit_count(dir.path(), &base, &head).unwrap(), 1);
        let log = log_oneline(dir.path(), &base, &head).unwrap();
        assert!(log[0].contains("second"));
    }

    #[test]
    fn working_tree_changes_include_untracked() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "init");
        std::fs::write(dir.path().join("new.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.txt"), "changed").unwrap();

        let files = changed_files_working(dir.path()).unwrap();
        assert!(files.contains(&"new.txt".to_string()));
        assert!(files.contains(&"a.txt".to_string()));
    }

    #[test]
    fn rev_exists_distinguishes_real_and_fake() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "init");
        let head = head_sha(dir.path()).unwrap().unwrap();
        assert!(rev_exists(dir.path(), &head));
        assert!(rev_exists(dir.path(), "HEAD"));
        assert!(!rev_exists(dir.path(), "deadbeef"));
    }

    #[test]
    fn tracked_files_counts_committed_paths() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "a", "init");
        std::fs::write(dir.path().join("untracked.txt"), "x").unwrap();
        assert_eq!(tracked_files_count(dir.path()).unwrap(), 1);
    }

    #[test]
    fn diff_against_empty_tree_shows_first_files() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        let patch = diff_working(dir.path(), EMPTY_TREE_SHA);
        // Untracked files are invisible to plain diff until added.
        assert!(patch.unwrap().is_empty());
        git(dir.path(), &["add", "."]);
        let patch = diff_working(dir.path(), EMPTY_TREE_SHA).unwrap();
        assert!(patch.contains("hello"));
    }
}
