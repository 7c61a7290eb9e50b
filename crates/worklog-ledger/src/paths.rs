use std::path::{Path, PathBuf};

/// All well-known paths under the data root.
#[derive(Debug, Clone)]
pub struct WorklogPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub events_ndjson: PathBuf,
    pub sessions_ndjson: PathBuf,
    pub summaries_ndjson: PathBuf,
    pub artifacts_dir: PathBuf,
    pub captures_dir: PathBuf,
    pub summaries_dir: PathBuf,
    pub journal_dir: PathBuf,
    pub config_json: PathBuf,
}

impl WorklogPaths {
    /// Derive all paths from a data root. Pure computation, no I/O.
    pub fn discover(data_root: impl Into<PathBuf>) -> Self {
        let root = data_root.into();
        let index_dir = root.join("index");
        let artifacts_dir = root.join("artifacts");
        Self {
            events_ndjson: index_dir.join("events.ndjson"),
            sessions_ndjson: index_dir.join("sessions.ndjson"),
            summaries_ndjson: index_dir.join("summaries.ndjson"),
            captures_dir: artifacts_dir.join("captures"),
            summaries_dir: artifacts_dir.join("summaries"),
            journal_dir: root.join("journal"),
            config_json: root.join("config.json"),
            index_dir,
            artifacts_dir,
            root,
        }
    }

    /// Resolve the data root: explicit override, then `WORKLOG_DATA_ROOT`,
    /// then the platform data directory.
    pub fn resolve_root(override_path: Option<&Path>) -> PathBuf {
        if let Some(p) = override_path {
            return p.to_path_buf();
        }
        if let Ok(env_root) = std::env::var("WORKLOG_DATA_ROOT") {
            if !env_root.trim().is_empty() {
                return PathBuf::from(env_root);
            }
        }
        dirs::data_dir()
            .map(|d| d.join("worklog"))
            .unwrap_or_else(|| PathBuf::from(".worklog"))
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [
            &self.index_dir,
            &self.artifacts_dir,
            &self.captures_dir,
            &self.summaries_dir,
            &self.journal_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.index_dir.is_dir()
    }

    /// Raw capture text + metadata sidecar live under
    /// `artifacts/captures/<day>/<session>/`.
    pub fn capture_dir(&self, day_id: &str, session_id: &str) -> PathBuf {
        self.captures_dir.join(day_id).join(session_id)
    }

    /// Immutable summary document pair directory for one day.
    pub fn summary_dir(&self, day_id: &str) -> PathBuf {
        self.summaries_dir.join(day_id)
    }

    /// Day journal file, `journal/<day>.md`.
    pub fn journal_file(&self, day_id: &str) -> PathBuf {
        self.journal_dir.join(format!("{day_id}.md"))
    }

    /// Session diff patch artifact, `artifacts/<session>_repo_diff_<stage>.patch`.
    pub fn diff_artifact(&self, session_id: &str, stage: &str) -> PathBuf {
        self.artifacts_dir
            .join(format!("{session_id}_repo_diff_{stage}.patch"))
    }
}
