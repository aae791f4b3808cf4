use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply the schema file to the database")]
    Init {
        #[arg(long, default_value = "sql/schema.sql", help = "Schema SQL file")]
        schema: PathBuf,
    },

    #[command(about = "Check database connectivity")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Init { schema } => {
            let sql = std::fs::read_to_string(&schema)?;
            let pool = DatabaseManager::pool().await?;

            let mut applied = 0usize;
            for statement in sql.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                sqlx::query(statement).execute(&pool).await?;
                applied += 1;
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "statements": applied }))
                }
                OutputFormat::Text => println!("Applied {} schema statements", applied),
            }
            Ok(())
        }
        DbCommands::Ping => {
            DatabaseManager::health_check().await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "database": "ok" })),
                OutputFormat::Text => println!("Database connection OK"),
            }
            Ok(())
        }
    }
}
