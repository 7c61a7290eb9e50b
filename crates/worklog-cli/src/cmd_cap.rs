use anyhow::{bail, Context};
use std::io::Read;
use std::path::Path;

use worklog_core::event::{new_capture_id, new_event, EventMeta};
use worklog_core::{
    hash, CaptureCreatedPayload, CaptureReoccurredPayload, EventKind, Link, SessionRef,
};
use worklog_derive::{build_sessions, classify_capture, similar_captures, CaptureClass};
use worklog_ledger::{Config, Ledger};

pub fn execute(
    data_root: &Path,
    title: Option<&str>,
    kind: &str,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let content = read_content(file)?;
    if content.trim().is_empty() {
        bail!("no capture content. Pipe error output to stdin or pass --file.");
    }

    let ledger = Ledger::open(data_root)?;
    let config = Config::load(&ledger.paths);
    let replay = ledger.read_all()?;

    let error_hash = hash::content_hash(&content);
    let class = classify_capture(&replay.events, &error_hash);
    let title = match title {
        Some(t) => t.to_string(),
        None => worklog_classify::classify_title(&content, &config),
    };

    // Capture lands in the current session when one is open, at the day
    // level otherwise.
    let selection = build_sessions(&replay.events).current(None);
    for anomaly in &selection.anomalies {
        eprintln!("warning: {anomaly}");
    }
    let (day, session_id) = match &selection.session {
        Some(s) => (s.day_id.clone(), Some(s.session_id.clone())),
        None => (worklog_core::clock::today(), None),
    };
    let scope = session_id.as_deref().unwrap_or("day");

    let cap_id = new_capture_id();
    let dir = ledger.paths.capture_dir(&day, scope);
    std::fs::create_dir_all(&dir)?;
    let text_path = dir.join(format!("{cap_id}.txt"));
    std::fs::write(&text_path, &content)?;
    let artifact_ref = format!("artifacts/captures/{day}/{scope}/{cap_id}.txt");

    let kind_event = match &class {
        CaptureClass::Created => EventKind::CaptureCreated(CaptureCreatedPayload {
            kind: kind.to_string(),
            title: title.clone(),
            error_hash: error_hash.clone(),
            artifact_ref: artifact_ref.clone(),
        }),
        CaptureClass::Reoccurred { original_event_id } => {
            EventKind::CaptureReoccurred(CaptureReoccurredPayload {
                title: title.clone(),
                error_hash: error_hash.clone(),
                original_event_id: original_event_id.clone(),
                artifact_ref: artifact_ref.clone(),
            })
        }
    };
    let event = new_event(
        kind_event,
        EventMeta {
            session: Some(SessionRef::scoped(day.clone(), session_id)),
            links: vec![Link::artifact(&artifact_ref)],
            ..Default::default()
        },
    );

    let meta = serde_json::json!({
        "cap_id": cap_id,
        "event_id": event.event_id,
        "title": title,
        "error_hash": error_hash,
        "kind": kind,
        "ts": event.ts,
    });
    std::fs::write(
        dir.join(format!("{cap_id}.meta.json")),
        serde_json::to_string_pretty(&meta)?,
    )?;
    ledger.append(&event)?;

    match &class {
        CaptureClass::Created => println!("Captured {} ({title})", event.event_id),
        CaptureClass::Reoccurred { original_event_id } => println!(
            "Captured {} ({title}), recurrence of {original_event_id}",
            event.event_id
        ),
    }

    let similar = similar_captures(&replay.events, &title, &error_hash);
    if !similar.is_empty() {
        eprintln!("similar captures:");
        for s in similar.iter().take(5) {
            eprintln!("  {} {} ({})", s.event_id, s.title, s.ts);
        }
    }
    Ok(())
}

fn read_content(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
