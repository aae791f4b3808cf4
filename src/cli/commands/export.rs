use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::services::export::{fetch_residents, residents_to_csv};

#[derive(Subcommand)]
pub enum ExportCommands {
    #[command(about = "Export residents to a CSV file")]
    Residents {
        #[arg(long, help = "Output CSV path")]
        output: PathBuf,
        #[arg(long, help = "Restrict to one mandal")]
        mandal: Option<String>,
        #[arg(long, help = "Restrict to one secretariat")]
        secretariat: Option<String>,
    },
}

pub async fn handle(cmd: ExportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ExportCommands::Residents {
            output,
            mandal,
            secretariat,
        } => {
            let mut doc = serde_json::Map::new();
            if let Some(m) = mandal {
                doc.insert("mandal_name".into(), json!(m));
            }
            if let Some(s) = secretariat {
                doc.insert("sec_name".into(), json!(s));
            }
            let where_doc = if doc.is_empty() {
                None
            } else {
                Some(serde_json::Value::Object(doc))
            };

            let pool = DatabaseManager::pool().await?;
            let residents = fetch_residents(&pool, where_doc).await?;
            let csv = residents_to_csv(&residents);
            std::fs::write(&output, csv)?;

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "rows": residents.len(), "output": output })
                ),
                OutputFormat::Text => {
                    println!("Wrote {} resident(s) to {}", residents.len(), output.display())
                }
            }
            Ok(())
        }
    }
}
