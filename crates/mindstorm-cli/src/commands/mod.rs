pub mod run;
pub mod verify_key;

use std::str::FromStr;

use mindstorm_interaction::Provider;
use strum::IntoEnumIterator;

/// Clap value parser for `--provider`, with the known names in the error.
pub fn parse_provider(value: &str) -> Result<Provider, String> {
    Provider::from_str(value).map_err(|_| {
        let known: Vec<String> = Provider::iter().map(|p| p.to_string()).collect();
        format!(
            "unknown provider '{value}' (expected one of: {})",
            known.join(", ")
        )
    })
}
