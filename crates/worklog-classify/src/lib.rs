//! Short titles for captured error text.
//!
//! When an OpenAI-compatible endpoint is reachable it writes the title;
//! any failure (no key, timeout, bad response) degrades to a local
//! pattern heuristic. Classification can therefore never fail a capture.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use worklog_ledger::Config;

const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TITLE_CHARS: usize = 60;
const DEFAULT_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Title a capture. Remote first when credentials exist, heuristic
/// otherwise; the result is always non-empty and at most 60 characters.
pub fn classify_title(text: &str, config: &Config) -> String {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            match remote_title(text, config, &key) {
                Ok(title) if !title.trim().is_empty() => return truncate(title.trim()),
                Ok(_) => tracing::warn!("classifier returned empty title, using heuristic"),
                Err(err) => tracing::warn!(%err, "classifier unavailable, using heuristic"),
            }
        }
    }
    heuristic_title(text)
}

fn remote_title(text: &str, config: &Config, api_key: &str) -> Result<String> {
    let base = config.classify_url.as_deref().unwrap_or(DEFAULT_URL);
    let model = config.classify_model.as_deref().unwrap_or(DEFAULT_MODEL);
    let url = format!("{}/chat/completions", base.trim_end_matches('/'));
    let body = serde_json::json!({
        "model": model,
        "max_tokens": 30,
        "messages": [
            {
                "role": "system",
                "content": "Summarize the following error output as a short one-line title, \
                            at most 60 characters. Reply with the title only."
            },
            { "role": "user", "content": text }
        ],
    });

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent();
    let mut response = agent
        .post(&url)
        .header("Authorization", &format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .send(body.to_string())?;
    let parsed: serde_json::Value = response.body_mut().read_json()?;
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("classifier response had no message content"))
}

fn error_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][A-Za-z]*(?:Error|Exception)|panicked|panic)\b").unwrap()
    })
}

fn file_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\w./\\-]+\.[A-Za-z]{1,4}):(\d+)").unwrap())
}

/// Local fallback: pull out an error type and the first file:line
/// location, or fall back to the first non-empty line of the text.
pub fn heuristic_title(text: &str) -> String {
    let error_type = error_type_re()
        .captures(text)
        .map(|c| c[1].to_string());
    let location = file_line_re()
        .captures(text)
        .map(|c| format!("{}:{}", &c[1], &c[2]));

    let title = match (error_type, location) {
        (Some(e), Some(l)) => format!("{e} at {l}"),
        (Some(e), None) => e,
        (None, Some(l)) => format!("error at {l}"),
        (None, None) => text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("untitled capture")
            .to_string(),
    };
    truncate(&title)
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_TITLE_CHARS).collect()
}
