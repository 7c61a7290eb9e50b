use std::path::Path;
use worklog_ledger::{Ledger, WorklogPaths};

pub fn execute(data_root: &Path) -> anyhow::Result<()> {
    let paths = WorklogPaths::discover(data_root);
    if paths.is_initialized() {
        println!("Already initialized at {}", paths.root.display());
        return Ok(());
    }
    Ledger::init(data_root)?;
    println!("Initialized worklog data root at {}", paths.root.display());
    println!("  events:    {}", paths.events_ndjson.display());
    println!("  artifacts: {}", paths.artifacts_dir.display());
    println!("  journal:   {}", paths.journal_dir.display());
    Ok(())
}
