//! Replay-driven day summaries.
//!
//! The engine reads the full log, scores the day, renders a markdown
//! narrative plus a JSON payload as immutable artifacts, and appends the
//! result back to the log as a summary event. Nothing here is cached; a
//! summary is a pure function of the log at the moment it runs.

pub mod analyze;
pub mod generate;
pub mod journal;
pub mod render;

pub use analyze::{assess, latest_prior_rolling, rolling_delta, Analysis};
pub use generate::{generate, SummaryOutcome};
pub use journal::{append_journal_entry, ensure_journal, read_objective};
