mod cmd_cap;
mod cmd_config;
mod cmd_day;
mod cmd_fix;
mod cmd_init;
mod cmd_log;
mod cmd_serve;
mod cmd_session;
mod cmd_status;
mod cmd_suggest;
mod cmd_summary;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use worklog_ledger::WorklogPaths;

#[derive(Parser)]
#[command(name = "worklog", version, about = "Event-sourced work session tracker")]
struct Cli {
    /// Data root override (default: $WORKLOG_DATA_ROOT, then the platform data dir)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the data root layout
    Init,
    /// Session lifecycle
    Session {
        #[command(subcommand)]
        cmd: cmd_session::SessionCmd,
    },
    /// Day-level status and closure
    Day {
        #[command(subcommand)]
        cmd: cmd_day::DayCmd,
    },
    /// Generate a summary document
    Summary {
        #[command(subcommand)]
        cmd: cmd_summary::SummaryCmd,
    },
    /// Capture error output (from stdin or a file)
    Cap {
        /// Title override (otherwise classified from the content)
        #[arg(long)]
        title: Option<String>,
        /// Capture kind label
        #[arg(long, default_value = "error")]
        kind: String,
        /// Read content from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Link a fix to a capture
    Fix {
        /// Target capture (event id or artifact fragment; default: latest unfixed)
        #[arg(long)]
        from_capture: Option<String>,
        /// Fix title (default: the capture's title)
        #[arg(long)]
        title: Option<String>,
        /// Revision that already contains the fix
        #[arg(long)]
        sha: Option<String>,
    },
    /// Bind a fix to a commit (idempotent)
    FixCommit {
        /// Fix id (default: the most recent fix)
        #[arg(long)]
        fix: Option<String>,
        /// Commit sha (default: repository HEAD)
        #[arg(long)]
        commit: Option<String>,
    },
    /// Suggest a commit command for the work in progress
    Suggest,
    /// Show current session, day, and open captures
    Status,
    /// List recent events
    Log {
        /// Filter by event type name
        #[arg(long = "type")]
        event_type: Option<String>,
        /// Filter by day
        #[arg(long)]
        day: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Read or write config values
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Start the read-only HTTP server
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value = "7333")]
        port: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_root = WorklogPaths::resolve_root(cli.data_root.as_deref());

    match cli.cmd {
        Command::Init => cmd_init::execute(&data_root),
        Command::Session { cmd } => cmd_session::run(cmd, &data_root),
        Command::Day { cmd } => cmd_day::run(cmd, &data_root),
        Command::Summary { cmd } => cmd_summary::run(cmd, &data_root),
        Command::Cap { title, kind, file } => {
            cmd_cap::execute(&data_root, title.as_deref(), &kind, file.as_deref())
        }
        Command::Fix {
            from_capture,
            title,
            sha,
        } => cmd_fix::link(
            &data_root,
            from_capture.as_deref(),
            title.as_deref(),
            sha.as_deref(),
        ),
        Command::FixCommit { fix, commit } => {
            cmd_fix::commit(&data_root, fix.as_deref(), commit.as_deref())
        }
        Command::Suggest => cmd_suggest::execute(&data_root),
        Command::Status => cmd_status::execute(&data_root),
        Command::Log {
            event_type,
            day,
            limit,
            json,
        } => cmd_log::execute(&data_root, event_type.as_deref(), day.as_deref(), limit, json),
        Command::Config { cmd } => cmd_config::run(cmd, &data_root),
        Command::Serve { bind, port } => cmd_serve::execute(&data_root, &bind, port),
    }
}
