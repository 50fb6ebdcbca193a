use super::engine_config;
use crate::format::{formatter, CsvFormatter};
use clap::Args;
use querydeck_engine::{Archive, CallResult, EngineConfig};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Args)]
pub struct ExportCommand {
    /// Call whose archived result to export
    pub call_id: String,

    /// Output format: json, csv
    #[arg(long, default_value = "json")]
    pub format: String,

    /// First row to export; negative counts from the end
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub from: i64,

    /// Row after the last one to export; -1 means through the last row
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub to: i64,

    /// File to write to instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// CSV field separator
    #[arg(long, default_value_t = ',')]
    pub separator: char,

    /// CSV text written for null values
    #[arg(long, default_value = "")]
    pub null_value: String,

    /// Omit the CSV header line
    #[arg(long)]
    pub no_header: bool,

    /// State directory holding archives and call logs
    #[arg(long, env = "QUERYDECK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl ExportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = engine_config(self.state_dir.clone())?;
        info!(
            "Exporting rows [{}, {}) of call {} as {}",
            self.from, self.to, self.call_id, self.format
        );

        let rt = tokio::runtime::Runtime::new()?;
        let bytes = rt.block_on(self.render(&config))?;

        rt.block_on(async {
            match &self.output {
                Some(path) => {
                    tokio::fs::write(path, &bytes).await?;
                    info!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
            }
            Ok::<(), std::io::Error>(())
        })?;
        Ok(())
    }

    /// Load the archive and format the requested range
    async fn render(&self, config: &EngineConfig) -> querydeck_core::Result<Vec<u8>> {
        let csv = CsvFormatter::new()
            .separator(self.separator)
            .null_value(&self.null_value)
            .with_column_names(!self.no_header);
        let formatter = formatter(&self.format, csv)?;

        let archive = Archive::new(config, &self.call_id)?;
        let stream = archive.get_result().await?;

        let result = CallResult::new(config.rows_poll_interval(), config.rows_timeout());
        result.set_stream(stream, || {}).await?;
        result.format(formatter.as_ref(), self.from, self.to).await
    }
}
