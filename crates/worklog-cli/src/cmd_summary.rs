use clap::Subcommand;
use std::path::Path;

use worklog_core::{clock, SummaryMode};
use worklog_ledger::{Config, Ledger};
use worklog_summary::SummaryOutcome;

#[derive(Subcommand)]
pub enum SummaryCmd {
    /// Mid-day snapshot of the current work (requires an active session)
    Rolling,
    /// End-of-day document (requires a closed day unless --force)
    Nightly {
        #[arg(long)]
        day_id: Option<String>,
        /// Generate even though the day is still open
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: SummaryCmd, data_root: &Path) -> anyhow::Result<()> {
    match cmd {
        SummaryCmd::Rolling => rolling(data_root),
        SummaryCmd::Nightly { day_id, force } => nightly(data_root, day_id.as_deref(), force),
    }
}

fn print_outcome(outcome: &SummaryOutcome) {
    println!("  assessment: {}", outcome.payload.assessment);
    println!("  next step:  {}", outcome.payload.next_step);
    if let Some(blocker) = &outcome.payload.blocker {
        println!("  blocker:    {blocker}");
    }
    println!("  document:   {}", outcome.markdown_path.display());
    if outcome.skipped > 0 {
        eprintln!("warning: skipped {} malformed log line(s)", outcome.skipped);
    }
}

pub fn rolling(data_root: &Path) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let config = Config::load(&ledger.paths);
    let day = clock::today();
    let outcome = worklog_summary::generate(&ledger, &config, SummaryMode::Rolling, &day, false)?;
    println!("Rolling summary {} ({day})", outcome.payload.summary_version);
    print_outcome(&outcome);
    Ok(())
}

pub fn nightly(data_root: &Path, day_id: Option<&str>, force: bool) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let config = Config::load(&ledger.paths);
    let day = day_id.map(|d| d.to_string()).unwrap_or_else(clock::today);

    if force {
        eprint!("Day {day} is not closed. Generate the nightly summary anyway? [y/N] ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let outcome = worklog_summary::generate(&ledger, &config, SummaryMode::Nightly, &day, force)?;
    println!("Nightly summary {} ({day})", outcome.payload.summary_version);
    print_outcome(&outcome);
    Ok(())
}
