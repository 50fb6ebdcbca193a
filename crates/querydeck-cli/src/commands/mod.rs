pub mod connections;
pub mod export;
pub mod history;
pub mod purge;

pub use connections::ConnectionsCommand;
pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use purge::PurgeCommand;

use querydeck_engine::{CallLog, EngineConfig};
use std::path::PathBuf;
use tracing::debug;

/// Engine configuration from the environment, with `state_dir` taking
/// precedence when given on the command line
pub(crate) fn engine_config(state_dir: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    if let Some(dir) = state_dir {
        config.state_dir = dir;
    }
    debug!("Using state directory {}", config.state_dir.display());
    Ok(config)
}

pub(crate) fn call_log(config: &EngineConfig) -> CallLog {
    CallLog::new(config.call_log_dir())
}
