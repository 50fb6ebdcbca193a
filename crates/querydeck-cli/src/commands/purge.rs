use super::{call_log, engine_config};
use clap::Args;
use colored::Colorize;
use querydeck_engine::{Archive, CallLog, EngineConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct PurgeCommand {
    /// Call whose archive to delete
    pub call_id: String,

    /// State directory holding archives and call logs
    #[arg(long, env = "QUERYDECK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

/// Delete the archive of `call_id` and drop it from every call log.
/// Returns the connections whose log mentioned the call.
async fn purge(config: &EngineConfig, log: &CallLog, call_id: &str) -> anyhow::Result<Vec<String>> {
    Archive::new(config, call_id)?.remove().await?;

    let mut touched = Vec::new();
    for connection_id in log.connection_ids().await? {
        let mut records = match log.load(&connection_id).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping unreadable call log {}: {}", connection_id, e);
                continue;
            }
        };

        let before = records.len();
        records.retain(|record| record.id != call_id);
        if records.len() != before {
            log.save(&connection_id, &records).await?;
            touched.push(connection_id);
        }
    }
    Ok(touched)
}

impl PurgeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = engine_config(self.state_dir)?;
        info!("Purging call {}", self.call_id);

        let rt = tokio::runtime::Runtime::new()?;
        let touched = rt.block_on(purge(&config, &call_log(&config), &self.call_id))?;

        if touched.is_empty() {
            println!(
                "{} {}",
                "Removed archive of unlogged call".bright_yellow(),
                self.call_id.bright_cyan()
            );
        } else {
            println!(
                "{} {} ({})",
                "Purged call".bright_green(),
                self.call_id.bright_cyan(),
                touched.join(", ")
            );
        }
        Ok(())
    }
}
