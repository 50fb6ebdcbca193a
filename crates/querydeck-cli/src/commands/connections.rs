use super::{call_log, engine_config};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct ConnectionsCommand {
    /// State directory holding archives and call logs
    #[arg(long, env = "QUERYDECK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl ConnectionsCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = engine_config(self.state_dir)?;
        info!("Listing connections in {}", config.state_dir.display());

        let rt = tokio::runtime::Runtime::new()?;
        let log = call_log(&config);
        let summaries = rt.block_on(async {
            let mut summaries = Vec::new();
            for id in log.connection_ids().await? {
                let calls = log.load(&id).await?.len();
                summaries.push((id, calls));
            }
            Ok::<_, anyhow::Error>(summaries)
        })?;

        if summaries.is_empty() {
            println!("{}", "No connections with call history.".bright_yellow());
            return Ok(());
        }

        for (id, calls) in &summaries {
            println!(
                "{}  {} {}",
                id.bright_cyan(),
                calls.to_string().bright_white(),
                if *calls == 1 { "call" } else { "calls" }
            );
        }
        Ok(())
    }
}
