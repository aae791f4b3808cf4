use clap::Subcommand;

use crate::access::{Role, SecretariatAssignment};
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::services::users;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an operator account")]
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: String,
        #[arg(long, help = "ADMIN, PANCHAYAT_SECRETARY or FIELD_OFFICER")]
        role: String,
        #[arg(long, help = "Assigned mandal (mandal officers)")]
        mandal: Option<String>,
        #[arg(
            long = "assign",
            help = "Secretariat assignment as MANDAL:SECRETARIAT (repeatable, field officers)"
        )]
        assignments: Vec<String>,
    },

    #[command(about = "List operator accounts")]
    List,

    #[command(about = "Deactivate an account")]
    Deactivate {
        #[arg(long)]
        username: String,
    },

    #[command(about = "Reset an account password")]
    ResetPassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

fn parse_assignment(raw: &str) -> anyhow::Result<SecretariatAssignment> {
    let (mandal, sec) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Assignment must be MANDAL:SECRETARIAT, got: {raw}"))?;
    let mandal = mandal.trim();
    let sec = sec.trim();
    if mandal.is_empty() || sec.is_empty() {
        anyhow::bail!("Assignment must be MANDAL:SECRETARIAT, got: {raw}");
    }
    Ok(SecretariatAssignment::new(mandal, sec))
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;

    match cmd {
        UserCommands::Create {
            username,
            password,
            display_name,
            role,
            mandal,
            assignments,
        } => {
            let role: Role = role
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let assignments = assignments
                .iter()
                .map(|a| parse_assignment(a))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let user = users::create_user(
                &pool,
                users::NewUser {
                    username,
                    password,
                    display_name,
                    role,
                    mandal_name: mandal,
                    assignments,
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "id": user.id, "username": user.username })
                ),
                OutputFormat::Text => {
                    println!("Created {} account: {} ({})", user.role, user.username, user.id)
                }
            }
            Ok(())
        }
        UserCommands::List => {
            let users = users::list_users(&pool).await?;
            match output_format {
                OutputFormat::Json => {
                    let rows: Vec<_> = users
                        .iter()
                        .map(|u| {
                            serde_json::json!({
                                "id": u.id,
                                "username": &u.username,
                                "role": &u.role,
                                "mandal_name": &u.mandal_name,
                                "is_active": u.is_active,
                                "last_login_at": u.last_login_at,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::Value::Array(rows));
                }
                OutputFormat::Text => {
                    for u in &users {
                        let status = if u.is_active { "active" } else { "inactive" };
                        println!(
                            "{:<24} {:<20} {:<10} {}",
                            u.username,
                            u.role,
                            status,
                            u.mandal_name.as_deref().unwrap_or("-")
                        );
                    }
                    println!("{} account(s)", users.len());
                }
            }
            Ok(())
        }
        UserCommands::Deactivate { username } => {
            let user = users::find_by_username(&pool, &username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No such user: {username}"))?;
            users::set_active(&pool, user.id, false)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Deactivated {}", username);
            Ok(())
        }
        UserCommands::ResetPassword { username, password } => {
            let user = users::find_by_username(&pool, &username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No such user: {username}"))?;
            users::reset_password(&pool, user.id, &password)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Password reset for {}", username);
            Ok(())
        }
    }
}
