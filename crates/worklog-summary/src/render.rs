//! Markdown rendering for summary documents.

use worklog_core::{SummaryMode, SummaryPayload};
use worklog_derive::OpenCapture;

/// Render the human-facing narrative for a summary payload. The JSON
/// sibling carries the same data for machines; this document is what
/// ends up in front of the developer the next morning.
pub fn render_markdown(payload: &SummaryPayload, open: &[OpenCapture], sessions: usize) -> String {
    let mut out = String::new();
    let heading = match payload.mode {
        SummaryMode::Rolling => "Rolling summary",
        SummaryMode::Nightly => "Daily summary",
    };
    out.push_str(&format!("# {heading}: {}\n\n", payload.day_id));
    if !payload.objective.is_empty() {
        out.push_str(&format!("Objective: {}\n\n", payload.objective));
    }
    out.push_str(&format!("- Assessment: **{}**\n", payload.assessment));
    out.push_str(&format!("- Next step: {}\n", payload.next_step));
    if let Some(blocker) = &payload.blocker {
        out.push_str(&format!("- Blocker: {blocker}\n"));
    }
    out.push_str(&format!("- Sessions touched: {sessions}\n"));
    out.push_str(&format!(
        "- Window: {} .. {}\n",
        payload.window_start, payload.window_end
    ));

    if !payload.risks.is_empty() {
        out.push_str("\n## Risks\n\n");
        for risk in &payload.risks {
            out.push_str(&format!("- {risk}\n"));
        }
    }

    if payload.mode == SummaryMode::Rolling {
        let d = &payload.delta;
        out.push_str("\n## Since last rolling summary\n\n");
        out.push_str(&format!("- New events: {}\n", d.new_events));
        out.push_str(&format!(
            "- New commit suggestions: {}\n",
            d.new_commit_suggestions
        ));
        out.push_str(&format!("- New captures: {}\n", d.new_captures));
        if d.assessment_changed {
            out.push_str("- Assessment changed since the previous summary\n");
        }
    }

    if !open.is_empty() {
        out.push_str("\n## Open captures\n\n");
        for cap in open {
            out.push_str(&format!("- `{}` {} ({})\n", cap.event_id, cap.title, cap.ts));
        }
    }

    out.push_str(&format!("\n_version: {}_\n", payload.summary_version));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklog_core::{Assessment, Delta};

    fn payload(mode: SummaryMode) -> SummaryPayload {
        SummaryPayload {
            day_id: "2020-05-05".to_string(),
            mode,
            window_start: "2020-05-05T09:00:00.000Z".to_string(),
            window_end: "2020-05-05T17:00:00.000Z".to_string(),
            summary_version: "rolling_20200505T170000".to_string(),
            assessment: Assessment::Blocked,
            next_step: "fix the capture".to_string(),
            blocker: Some("1 unfixed capture(s)".to_string()),
            risks: vec!["unresolved errors accumulating".to_string()],
            delta: Delta {
                new_events: 3,
                new_commit_suggestions: 1,
                new_captures: 1,
                assessment_changed: true,
            },
            objective: "land the parser".to_string(),
            artifact_ref: "artifacts/summaries/2020-05-05/x.md".to_string(),
        }
    }

    #[test]
    fn rolling_document_carries_all_sections() {
        let md = render_markdown(&payload(SummaryMode::Rolling), &[], 2);
        assert!(md.starts_with("# Rolling summary: 2020-05-05"));
        assert!(md.contains("Objective: land the parser"));
        assert!(md.contains("**BLOCKED**"));
        assert!(md.contains("Blocker: 1 unfixed"));
        assert!(md.contains("## Since last rolling summary"));
        assert!(md.contains("New events: 3"));
        assert!(md.contains("Assessment changed"));
        assert!(md.contains("version: rolling_20200505T170000"));
    }

    #[test]
    fn nightly_document_omits_delta_section() {
        let md = render_markdown(&payload(SummaryMode::Nightly), &[], 1);
        assert!(md.starts_with("# Daily summary"));
        assert!(!md.contains("Since last rolling summary"));
    }

    #[test]
    fn open_captures_are_listed() {
        let open = vec![OpenCapture {
            event_id: "evt_1".to_string(),
            ts: "2020-05-05T10:00:00.000Z".to_string(),
            title: "panic in loader".to_string(),
            error_hash: "aaa".to_string(),
            day_id: "2020-05-05".to_string(),
            session_id: Some("S01".to_string()),
            artifact_ref: "artifacts/captures/x.txt".to_string(),
        }];
        let md = render_markdown(&payload(SummaryMode::Rolling), &open, 1);
        assert!(md.contains("## Open captures"));
        assert!(md.contains("panic in loader"));
    }
}
