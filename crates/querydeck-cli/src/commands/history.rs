use super::{call_log, engine_config};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use querydeck_engine::{Call, CallState};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args)]
pub struct HistoryCommand {
    /// Connection whose calls to list
    pub connection_id: String,

    /// Print the calls as JSON instead of a listing
    #[arg(long)]
    pub json: bool,

    /// State directory holding archives and call logs
    #[arg(long, env = "QUERYDECK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

fn colored_state(state: CallState) -> colored::ColoredString {
    let text = state.to_string();
    match state {
        CallState::Archived => text.bright_green(),
        CallState::Failed | CallState::ArchiveFailed => text.bright_red(),
        CallState::Canceled => text.bright_yellow(),
        _ => text.white(),
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

impl HistoryCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = engine_config(self.state_dir)?;
        info!("Listing calls of connection {}", self.connection_id);

        let rt = tokio::runtime::Runtime::new()?;
        let records = rt.block_on(call_log(&config).load(&self.connection_id))?;

        // states are re-derived from what is actually archived
        let calls: Vec<_> = records
            .into_iter()
            .filter_map(|record| {
                let call_id = record.id.clone();
                Call::from_record(record, &config, None)
                    .map_err(|e| warn!("Skipping call {:?}: {}", call_id, e))
                    .ok()
            })
            .collect();

        if self.json {
            let records: Vec<_> = calls.iter().map(|call| call.to_record()).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if calls.is_empty() {
            println!(
                "{}",
                format!("No calls logged for connection {}.", self.connection_id).bright_yellow()
            );
            return Ok(());
        }

        for call in &calls {
            println!(
                "{} {} {} {}",
                call.id().bright_cyan(),
                format_timestamp(call.timestamp()).bright_white(),
                colored_state(call.state()),
                format_duration(call.time_taken()).bright_white()
            );
            println!("  {}", call.query().trim());
        }
        println!();
        println!(
            "{} {}",
            "Total calls:".bright_white().bold(),
            calls.len().to_string().bright_cyan()
        );
        Ok(())
    }
}
