//! Day journal: one markdown file per day under `journal/`.
//!
//! The top of the file belongs to the human. Lifecycle commands append
//! one-liners under the auto section and never touch anything above it.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

const AUTO_HEADER: &str = "## Log (auto)";

fn template(day_id: &str) -> String {
    format!("# {day_id}\n\nObjective: \n\n## Notes\n\n{AUTO_HEADER}\n")
}

/// Create the day file from the template if it does not exist yet.
pub fn ensure_journal(path: &Path, day_id: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, template(day_id))
        .with_context(|| format!("failed to create journal {}", path.display()))
}

/// Append one entry line to the auto section. The auto section is the
/// last section of the file, so this is a plain append.
pub fn append_journal_entry(path: &Path, day_id: &str, ts: &str, line: &str) -> Result<()> {
    ensure_journal(path, day_id)?;
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open journal {}", path.display()))?;
    writeln!(file, "- {ts} {line}")?;
    Ok(())
}

/// The day objective comes from the manual `Objective:` line, empty when
/// the human has not filled it in (or the file does not exist).
pub fn read_objective(path: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(path) else {
        return String::new();
    };
    extract_objective(&content)
}

fn extract_objective(content: &str) -> String {
    content
        .lines()
        .find_map(|l| l.strip_prefix("Objective:"))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_default()
}
