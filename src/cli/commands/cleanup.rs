use chrono::NaiveDate;
use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::services::cleanup::{self, CleanupReport};

#[derive(Subcommand)]
pub enum CleanupCommands {
    #[command(about = "Clear the legacy duplicate mobile column")]
    DedupeMobiles {
        #[arg(long, help = "Actually mutate; without this, report only")]
        apply: bool,
    },

    #[command(about = "Unify secretariat codes and PHC names against the PHC master list")]
    UnifyCodes {
        #[arg(long, help = "PHC master CSV (mandal_name, sec_name, sec_code, phc_name)")]
        master: PathBuf,
        #[arg(long, help = "Actually mutate; without this, report only")]
        apply: bool,
    },

    #[command(about = "Rewrite legacy string assignment blobs to the object format")]
    MigrateAssignments {
        #[arg(long, help = "Actually mutate; without this, report only")]
        apply: bool,
    },

    #[command(about = "Delete audit rows older than a cutoff date")]
    PurgeLogs {
        #[arg(long, help = "Cutoff date (YYYY-MM-DD); rows strictly older are removed")]
        before: String,
        #[arg(long, help = "Restrict to one field name (e.g. mobile_number)")]
        field: Option<String>,
        #[arg(long, help = "Actually delete; without this, report only")]
        apply: bool,
    },
}

fn print_report(name: &str, report: &CleanupReport, output_format: OutputFormat) {
    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "operation": name,
                "examined": report.examined,
                "affected": report.affected,
                "skipped": report.skipped,
                "applied": report.applied,
            })
        ),
        OutputFormat::Text => {
            let mode = if report.applied { "APPLIED" } else { "DRY RUN" };
            println!(
                "[{}] {}: examined {}, affected {}, skipped {}",
                mode, name, report.examined, report.affected, report.skipped
            );
            if !report.applied && report.affected > 0 {
                println!("Re-run with --apply to make these changes.");
            }
        }
    }
}

pub async fn handle(cmd: CleanupCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;

    match cmd {
        CleanupCommands::DedupeMobiles { apply } => {
            let report = cleanup::dedupe_mobiles(&pool, apply)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_report("dedupe-mobiles", &report, output_format);
            Ok(())
        }
        CleanupCommands::UnifyCodes { master, apply } => {
            let master_csv = std::fs::read_to_string(&master)?;
            let report = cleanup::unify_codes(&pool, &master_csv, apply)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_report("unify-codes", &report, output_format);
            Ok(())
        }
        CleanupCommands::MigrateAssignments { apply } => {
            let report = cleanup::migrate_assignments(&pool, apply)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_report("migrate-assignments", &report, output_format);
            Ok(())
        }
        CleanupCommands::PurgeLogs {
            before,
            field,
            apply,
        } => {
            let date = NaiveDate::parse_from_str(&before, "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("--before must be YYYY-MM-DD"))?;
            let cutoff = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
            let report = cleanup::purge_logs(&pool, cutoff, field.as_deref(), apply)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_report("purge-logs", &report, output_format);
            Ok(())
        }
    }
}
