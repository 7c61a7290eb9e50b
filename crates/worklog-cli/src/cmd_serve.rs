use std::path::Path;

use tracing_subscriber::EnvFilter;
use worklog_serve::ServeConfig;

pub fn execute(data_root: &Path, bind: &str, port: u16) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let config = ServeConfig {
        bind: bind.to_string(),
        port,
    };
    tokio::runtime::Runtime::new()?.block_on(worklog_serve::serve(data_root, config))
}
