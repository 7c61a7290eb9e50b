use anyhow::bail;
use clap::Subcommand;
use std::path::Path;

use worklog_ledger::config::{parse_value, read_map, write_map};
use worklog_ledger::WorklogPaths;

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. recent_window)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

pub fn run(cmd: ConfigCmd, data_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(data_root, &key, &value),
        ConfigCmd::Get { key } => get(data_root, &key),
        ConfigCmd::List => list(data_root),
    }
}

fn initialized_paths(data_root: &Path) -> anyhow::Result<WorklogPaths> {
    let paths = WorklogPaths::discover(data_root);
    if !paths.is_initialized() {
        bail!(
            "no worklog data root at {}. Run `worklog init` first.",
            data_root.display()
        );
    }
    Ok(paths)
}

/// `worklog config set <key> <value>`
pub fn set(data_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = initialized_paths(data_root)?;
    let mut map = read_map(&paths.config_json)?;
    map.insert(key.to_string(), parse_value(value));
    write_map(&paths.config_json, &map)?;
    println!("{key} = {value}");
    Ok(())
}

/// `worklog config get <key>`
pub fn get(data_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = initialized_paths(data_root)?;
    let map = read_map(&paths.config_json)?;
    match map.get(key) {
        Some(value) => println!("{value}"),
        None => println!("{key} is not set"),
    }
    Ok(())
}

/// `worklog config list`
pub fn list(data_root: &Path) -> anyhow::Result<()> {
    let paths = initialized_paths(data_root)?;
    let map = read_map(&paths.config_json)?;
    if map.is_empty() {
        println!("(no config set)");
        return Ok(());
    }
    for (key, value) in &map {
        println!("{key} = {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklog_ledger::{Config, Ledger};

    #[test]
    fn set_then_load_typed_config() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::init(dir.path()).unwrap();

        set(dir.path(), "recent_window", "25").unwrap();
        set(dir.path(), "classify_model", "gpt-4o").unwrap();

        let config = Config::load(&ledger.paths);
        assert_eq!(config.recent_window, 25);
        assert_eq!(config.classify_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn get_and_list_require_init() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none");
        assert!(get(&missing, "recent_window").is_err());
        assert!(list(&missing).is_err());
    }
}
