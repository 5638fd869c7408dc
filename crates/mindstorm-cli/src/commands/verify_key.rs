use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use mindstorm_core::classifier::ClassifierError;
use mindstorm_interaction::{ClaudeClassifier, GeminiClassifier, Provider};

use super::parse_provider;

#[derive(Debug, Args)]
pub struct VerifyKeyArgs {
    /// Classifier backend to check
    #[arg(long, default_value = "claude", value_parser = parse_provider)]
    pub provider: Provider,
}

/// Sends a one-token probe request so a bad key fails here instead of in
/// the middle of a session.
pub async fn run(args: VerifyKeyArgs) -> Result<()> {
    verify(args.provider)
        .await
        .with_context(|| format!("{} key verification failed", args.provider))?;

    println!("{}", format!("{} key accepted", args.provider).green());
    Ok(())
}

async fn verify(provider: Provider) -> Result<(), ClassifierError> {
    match provider {
        Provider::Claude => ClaudeClassifier::try_from_env()?.verify_key().await,
        Provider::Gemini => GeminiClassifier::try_from_env()?.verify_key().await,
    }
}
