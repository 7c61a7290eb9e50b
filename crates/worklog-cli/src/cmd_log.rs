use std::path::Path;

use worklog_ledger::Ledger;

/// `worklog log`: inspect the raw event stream, newest first.
pub fn execute(
    data_root: &Path,
    event_type: Option<&str>,
    day: Option<&str>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let ledger = Ledger::open(data_root)?;
    let replay = ledger.read_all()?;
    if replay.skipped > 0 {
        eprintln!("warning: skipped {} malformed log line(s)", replay.skipped);
    }

    let selected: Vec<_> = replay
        .events
        .iter()
        .filter(|e| event_type.is_none_or(|t| e.kind.type_name() == t))
        .filter(|e| day.is_none_or(|d| e.session.day_id == d))
        .collect();

    for event in selected.iter().rev().take(limit) {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            let session = event
                .session
                .session_id
                .as_deref()
                .unwrap_or("-");
            println!(
                "{} {:<28} {}/{}",
                event.ts,
                event.kind.type_name(),
                event.session.day_id,
                session
            );
        }
    }
    Ok(())
}
