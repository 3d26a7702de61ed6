use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod client;
mod core;
mod daemon;
mod notify;

#[derive(Parser)]
#[command(name = "icbc-watch")]
#[command(author, version, about = "ICBC road test appointment watcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for appointments until one at or before the target date appears
    Watch,

    /// Run a single poll cycle and print the earliest available date
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a test notification to verify Telegram and alert configuration
    NotifyTest,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch => {
            init_logging();
            let config = core::settings::Config::load()?;
            daemon::run(config).await
        }
        Commands::Check { json } => {
            init_logging();
            cli::check::run(json).await
        }
        Commands::NotifyTest => {
            init_logging();
            cli::notify_test::run().await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
