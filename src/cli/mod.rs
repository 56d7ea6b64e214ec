use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;

#[derive(Parser)]
#[command(name = "sampletrack")]
#[command(about = "Sampletrack CLI - admin interface for the sample tracking API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides config)")]
        port: Option<u16>,
    },

    #[command(about = "Check database connectivity")]
    Health,

    #[command(about = "Account administration")]
    Accounts {
        #[command(subcommand)]
        cmd: AccountCommands,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "List account ids matching an email substring")]
    Search { email: String },

    #[command(about = "Show an account as JSON")]
    Show { id: Uuid },

    #[command(about = "Irreversibly redact an account's identifying fields")]
    Scrub { id: Uuid },

    #[command(about = "Hard delete an account (teardown only)")]
    Delete { id: Uuid },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(crate::config::config().api.port);
            crate::serve(port).await
        }
        Commands::Health => {
            DatabaseManager::health_check().await.context("health check failed")?;
            println!("database: ok");
            Ok(())
        }
        Commands::Accounts { cmd } => handle_accounts(cmd).await,
    }
}

async fn handle_accounts(cmd: AccountCommands) -> anyhow::Result<()> {
    let mut tx = DatabaseManager::begin().await?;

    match cmd {
        AccountCommands::Search { email } => {
            let ids = AccountRepo::new(&mut tx).get_account_ids_by_email(&email).await?;
            for id in ids {
                println!("{}", id);
            }
        }
        AccountCommands::Show { id } => {
            let account = AccountRepo::new(&mut tx)
                .get_account(id)
                .await?
                .with_context(|| format!("account ({}) does not exist", id))?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        AccountCommands::Scrub { id } => {
            AccountRepo::new(&mut tx).scrub(id).await?;
            tx.commit().await?;
            println!("scrubbed {}", id);
        }
        AccountCommands::Delete { id } => {
            if !AccountRepo::new(&mut tx).delete_account(id).await? {
                anyhow::bail!("account ({}) does not exist", id);
            }
            tx.commit().await?;
            println!("deleted {}", id);
        }
    }
    Ok(())
}
