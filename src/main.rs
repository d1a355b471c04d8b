use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use bridgefx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Quote a conversion with an itemized fee breakdown
    Convert {
        /// Amount in the source currency
        amount: String,
        /// Source currency code (defaults to the configured one)
        from: Option<String>,
        /// Target currency code (defaults to the configured one)
        to: Option<String>,
        /// Swap source and target
        #[arg(short, long)]
        reverse: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current USDT rates
    Rates {
        /// Currency codes (defaults to the configured pair)
        currencies: Vec<String>,
    },
}

impl From<Commands> for bridgefx::AppCommand {
    fn from(cmd: Commands) -> bridgefx::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                reverse,
                json,
            } => bridgefx::AppCommand::Convert {
                amount,
                from,
                to,
                reverse,
                json,
            },
            Commands::Rates { currencies } => bridgefx::AppCommand::Rates { currencies },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => bridgefx::cli::setup::setup(),
        Some(cmd) => bridgefx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
