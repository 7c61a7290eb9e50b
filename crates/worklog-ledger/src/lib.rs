pub mod config;
pub mod ledger;
pub mod paths;

pub use config::Config;
pub use ledger::{Ledger, Replay};
pub use paths::WorklogPaths;
