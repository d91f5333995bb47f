use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod init;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Create the storage directory and history database
    Init {},
    /// Run the API server and Telegram webhook
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Set the server port
        #[arg(long, env = "PORT", default_value = "8443")]
        port: String,

        /// Register `WEBHOOK_URL` with Telegram on startup
        #[arg(long, action, default_value = "false")]
        set_webhook: bool,
    },
    /// Chat with the relay from the terminal
    Chat {
        /// Conversation to append to
        #[arg(long, default_value = "cli")]
        conversation_id: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    // Settings may come from a local .env file
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&config).await?;
        }
        Some(Command::Serve {
            host,
            port,
            set_webhook,
        }) => {
            serve::run(host, port, config, set_webhook).await?;
        }
        Some(Command::Chat { conversation_id }) => {
            chat::run(config, conversation_id).await?;
        }
        None => {}
    }

    Ok(())
}
