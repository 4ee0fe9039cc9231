use anyhow::Result;
use clap::{Parser, Subcommand};
use countr_cli::cmd::{self, simulate::Simulation};
use countr_cli::BotConfig;
use countr_core::{ChannelId, UserId};
use countr_flows::ActionCatalog;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "countr",
    about = "Inspect and dry-run flows of the countr counting bot",
    version,
    propagate_version = true
)]
struct Cli {
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn", env = "COUNTR_LOG_LEVEL")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every available action
    Actions,

    /// Compile every flow of a configuration and explain it
    Check {
        /// Configuration file
        config: PathBuf,
    },

    /// Run the flows a counting event triggers against an in-memory guild
    Simulate {
        /// Configuration file
        config: PathBuf,

        /// Counting channel id
        #[arg(long)]
        channel: ChannelId,

        /// Id of the user who counted
        #[arg(long)]
        user: UserId,

        /// Count to report (default: the next count)
        #[arg(long)]
        count: Option<u64>,

        /// Score to report (default: the user's score after counting)
        #[arg(long)]
        score: Option<u64>,

        /// Simulate a wrong number
        #[arg(long)]
        fail: bool,

        /// Message text (default: the count)
        #[arg(long)]
        content: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        // Print the full error chain
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let catalog = Arc::new(ActionCatalog::builtin());
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Actions => cmd::actions::run(&catalog, &mut out),
        Commands::Check { config } => {
            let config = BotConfig::load(&config)?;
            cmd::check::run(&config, &catalog, &mut out)
        }
        Commands::Simulate {
            config,
            channel,
            user,
            count,
            score,
            fail,
            content,
        } => {
            let config = BotConfig::load(&config)?;
            let simulation = Simulation {
                channel,
                user,
                count,
                score,
                fail,
                content,
            };
            cmd::simulate::run(&config, catalog, &simulation, &mut out).await
        }
    }
}
