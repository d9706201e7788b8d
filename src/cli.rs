//! CLI interface for mentor-bot

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::bot;
use crate::catalog::ContentCatalog;
use crate::config::{self, Config};
use crate::store::UserStore;

#[derive(Parser)]
#[command(name = "mentor-bot")]
#[command(about = "Menu-driven Telegram learning assistant with level-gated lessons", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (long-polling loop; default when no command given)
    Run,
    /// Configure the bot
    Config {
        /// Set the Telegram bot token
        #[arg(long)]
        set_token: Option<String>,
        /// Set the bot username used in referral links
        #[arg(long)]
        set_username: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Validate the content catalog
    Catalog {
        /// Catalog path (defaults to the configured one)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List registered users and their progress
    Users,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => bot::run(Config::load()?).await,

        Some(Commands::Config {
            set_token,
            set_username,
            show,
        }) => {
            if let Some(token) = set_token {
                config::set_token(&token)?;
            }
            if let Some(username) = set_username {
                config::set_username(&username)?;
            }
            if show {
                config::show_config()?;
            }
            Ok(())
        }

        Some(Commands::Catalog { path }) => {
            let path = match path {
                Some(path) => path,
                None => Config::load()?.storage.catalog_path,
            };
            let catalog = ContentCatalog::load(&path)?;
            catalog.validate()?;
            println!(
                "Catalog OK: {} topics, {} lessons",
                catalog.materials.len(),
                catalog.lessons.len()
            );
            Ok(())
        }

        Some(Commands::Users) => {
            let config = Config::load()?;
            let store = UserStore::load(&config.storage.users_path)?;
            if store.is_empty() {
                println!("No registered users.");
                return Ok(());
            }
            println!("{} registered user(s):", store.len());
            for (id, record) in store.iter() {
                println!(
                    "  {} ({}) — level {}, {} invited, {} lesson(s) completed",
                    id,
                    record.referral_name,
                    record.level,
                    record.invited.len(),
                    record.completed_lessons.len()
                );
            }
            Ok(())
        }
    }
}
