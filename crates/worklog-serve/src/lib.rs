//! Read-only HTTP surface over the event log.
//!
//! Every endpoint replays the log on request and derives its answer;
//! nothing here appends, caches, or holds state between requests. The
//! server can run beside any number of CLI writers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use worklog_core::{clock, Event, EventKind, SummaryMode};
use worklog_derive::{build_sessions, day_status, latest_chain, open_captures};
use worklog_ledger::Ledger;

pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
}

struct AppState {
    data_root: PathBuf,
}

impl AppState {
    fn open_ledger(&self) -> anyhow::Result<Ledger> {
        Ledger::open(&self.data_root)
    }
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub async fn serve(data_root: &Path, config: ServeConfig) -> anyhow::Result<()> {
    // Fail fast before binding: the surface is useless without a log.
    Ledger::open(data_root)?;
    let app = router(data_root);
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("worklog HTTP server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(data_root: &Path) -> Router {
    let state = Arc::new(AppState {
        data_root: data_root.to_path_buf(),
    });
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", get(get_sessions))
        .route("/api/sessions/current", get(get_current_session))
        .route("/api/sessions/active", get(get_active_session))
        .route("/api/events/recent", get(get_recent_events))
        .route("/api/captures/recent", get(get_recent_captures))
        .route("/api/captures/open", get(get_open_captures))
        .route("/api/chain/latest", get(get_latest_chain))
        .route("/api/summaries", get(get_summaries))
        .route("/api/summaries/latest", get(get_latest_summary))
        .route(
            "/api/summaries/{day_id}/{version}/content",
            get(get_summary_content),
        )
        .route("/api/day/status", get(get_day_status))
        .route("/api/metrics", get(get_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── Sessions ──

#[derive(Deserialize)]
struct RepoQuery {
    repo: Option<String>,
}

async fn get_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let index = build_sessions(&replay.events);
    Ok(Json(serde_json::json!({ "sessions": index.all() })))
}

async fn get_current_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let selection = build_sessions(&replay.events).current(params.repo.as_deref());
    Ok(Json(serde_json::to_value(selection)?))
}

async fn get_active_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RepoQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let selection = build_sessions(&replay.events).active(params.repo.as_deref());
    Ok(Json(serde_json::to_value(selection)?))
}

// ── Events & captures ──

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn get_recent_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let limit = params.limit.unwrap_or(20);
    let recent: Vec<&Event> = replay.events.iter().rev().take(limit).collect();
    Ok(Json(serde_json::json!({
        "events": recent,
        "skipped": replay.skipped,
    })))
}

async fn get_recent_captures(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let limit = params.limit.unwrap_or(20);
    let captures: Vec<&Event> = replay
        .events
        .iter()
        .rev()
        .filter(|e| e.kind.is_capture())
        .take(limit)
        .collect();
    Ok(Json(serde_json::json!({ "captures": captures })))
}

#[derive(Deserialize)]
struct OpenQuery {
    day_id: Option<String>,
    session_id: Option<String>,
}

async fn get_open_captures(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpenQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let open = open_captures(
        &replay.events,
        params.day_id.as_deref(),
        params.session_id.as_deref(),
    );
    Ok(Json(serde_json::json!({ "open": open })))
}

async fn get_latest_chain(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    Ok(Json(serde_json::json!({
        "chain": latest_chain(&replay.events),
    })))
}

// ── Summaries ──

#[derive(Deserialize)]
struct SummariesQuery {
    day_id: Option<String>,
    mode: Option<String>,
    limit: Option<usize>,
}

fn summary_matches(event: &Event, day_id: Option<&str>, mode: Option<&str>) -> bool {
    let payload = match &event.kind {
        EventKind::RollingSummaryGenerated(p) => p,
        EventKind::DailySummaryGenerated(p) => p,
        _ => return false,
    };
    if let Some(d) = day_id {
        if payload.day_id != d {
            return false;
        }
    }
    match mode {
        Some("rolling") => payload.mode == SummaryMode::Rolling,
        Some("nightly") => payload.mode == SummaryMode::Nightly,
        _ => true,
    }
}

async fn get_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummariesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_summaries()?;
    let limit = params.limit.unwrap_or(20);
    let summaries: Vec<&Event> = replay
        .events
        .iter()
        .rev()
        .filter(|e| summary_matches(e, params.day_id.as_deref(), params.mode.as_deref()))
        .take(limit)
        .collect();
    Ok(Json(serde_json::json!({ "summaries": summaries })))
}

async fn get_latest_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummariesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_summaries()?;
    let latest = replay
        .events
        .iter()
        .rev()
        .find(|e| summary_matches(e, params.day_id.as_deref(), params.mode.as_deref()));
    Ok(Json(serde_json::json!({ "summary": latest })))
}

async fn get_summary_content(
    State(state): State<Arc<AppState>>,
    UrlPath((day_id, version)): UrlPath<(String, String)>,
) -> Result<Response, AppError> {
    let ledger = state.open_ledger()?;
    // Versions are opaque tokens, never paths.
    if day_id.contains('/') || version.contains('/') || version.contains("..") {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid summary reference" })),
        )
            .into_response());
    }
    let path = ledger.paths.summary_dir(&day_id).join(format!("{version}.md"));
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Json(serde_json::json!({
            "day_id": day_id,
            "version": version,
            "content": content,
        }))
        .into_response()),
        Err(_) => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("no summary {version} for day {day_id}")
            })),
        )
            .into_response()),
    }
}

// ── Day & metrics ──

#[derive(Deserialize)]
struct DayQuery {
    day_id: Option<String>,
}

async fn get_day_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let day_id = params.day_id.unwrap_or_else(clock::today);
    let status = day_status(&replay.events, &day_id);
    Ok(Json(serde_json::to_value(status)?))
}

async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ledger = state.open_ledger()?;
    let replay = ledger.read_all()?;
    let index = build_sessions(&replay.events);
    let active = index.all().iter().filter(|s| s.is_active()).count();
    let summaries = replay.events.iter().filter(|e| e.kind.is_summary()).count();
    let captures = replay.events.iter().filter(|e| e.kind.is_capture()).count();
    Ok(Json(serde_json::json!({
        "events_total": replay.events.len(),
        "malformed_lines_skipped": replay.skipped,
        "sessions_total": index.all().len(),
        "active_sessions": active,
        "captures_total": captures,
        "open_captures": open_captures(&replay.events, None, None).len(),
        "summaries_total": summaries,
    })))
}
