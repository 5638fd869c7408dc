use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "mindstorm")]
#[command(
    about = "Mindstorm - collaborative brainstorming sessions turned into mindmaps",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Host a brainstorming session in the terminal
    Run(commands::run::RunArgs),
    /// Check that a classifier API key is configured and accepted
    VerifyKey(commands::verify_key::VerifyKeyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::VerifyKey(args) => commands::verify_key::run(args).await,
    }
}

/// Logs go to stderr so the REPL keeps stdout to itself.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
