pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chdc")]
#[command(about = "Operator CLI for the Chittoor district health registry")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output results as JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to API_PORT/PORT env or 3000)")]
        port: Option<u16>,
    },

    #[command(about = "Database schema management")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Operator account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Bulk CSV import")]
    Import {
        #[command(subcommand)]
        cmd: commands::import::ImportCommands,
    },

    #[command(about = "Bulk CSV export")]
    Export {
        #[command(subcommand)]
        cmd: commands::export::ExportCommands,
    },

    #[command(about = "Data-quality maintenance (dry-run by default)")]
    Cleanup {
        #[command(subcommand)]
        cmd: commands::cleanup::CleanupCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(crate::server::port_from_env);
            crate::server::serve(port).await
        }
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Import { cmd } => commands::import::handle(cmd, output_format).await,
        Commands::Export { cmd } => commands::export::handle(cmd, output_format).await,
        Commands::Cleanup { cmd } => commands::cleanup::handle(cmd, output_format).await,
    }
}
