use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::services::import::import_residents;

#[derive(Subcommand)]
pub enum ImportCommands {
    #[command(about = "Import residents from a CSV file")]
    Residents {
        #[arg(long, help = "CSV file with a header row")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: ImportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ImportCommands::Residents { file } => {
            let csv_text = std::fs::read_to_string(&file)?;
            let pool = DatabaseManager::pool().await?;

            let summary = import_residents(&pool, &csv_text)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "total_rows": summary.total_rows,
                        "inserted": summary.inserted,
                        "skipped": summary.skipped,
                    })
                ),
                OutputFormat::Text => println!(
                    "Imported {} of {} rows ({} skipped)",
                    summary.inserted, summary.total_rows, summary.skipped
                ),
            }
            Ok(())
        }
    }
}
