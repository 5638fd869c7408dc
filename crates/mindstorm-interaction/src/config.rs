//! Secret configuration: API keys for classifier backends.
//!
//! Supports reading secrets from `~/.config/mindstorm/secret.json`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub claude: Option<ProviderSecret>,
    #[serde(default)]
    pub gemini: Option<ProviderSecret>,
}

/// Per-provider credentials and optional model override.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file from ~/.config/mindstorm/secret.json
pub fn load_secret_config() -> Result<SecretConfig, String> {
    let config_path = get_config_path()?;
    load_secret_config_from(&config_path)
}

/// Loads a secret configuration file from an explicit path.
pub fn load_secret_config_from(config_path: &Path) -> Result<SecretConfig, String> {
    if !config_path.exists() {
        return Err(format!(
            "Configuration file not found at: {}",
            config_path.display()
        ));
    }

    let content = fs::read_to_string(config_path).map_err(|e| {
        format!(
            "Failed to read configuration file at {}: {}",
            config_path.display(),
            e
        )
    })?;

    serde_json::from_str(&content).map_err(|e| {
        format!(
            "Failed to parse configuration file at {}: {}",
            config_path.display(),
            e
        )
    })
}

/// Returns the path to the configuration file: ~/.config/mindstorm/secret.json
fn get_config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "Could not determine home directory".to_string())?;
    Ok(home.join(".config").join("mindstorm").join("secret.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parses_both_providers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "claude": {{"api_key": "sk-test", "model_name": "claude-sonnet-4-6"}},
                "gemini": {{"api_key": "g-test"}}
            }}"#
        )
        .unwrap();

        let config = load_secret_config_from(file.path()).unwrap();
        let claude = config.claude.unwrap();
        assert_eq!(claude.api_key, "sk-test");
        assert_eq!(claude.model_name.as_deref(), Some("claude-sonnet-4-6"));
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, "g-test");
        assert!(gemini.model_name.is_none());
    }

    #[test]
    fn test_providers_are_optional() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = load_secret_config_from(file.path()).unwrap();
        assert!(config.claude.is_none());
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_missing_file_error_names_the_path() {
        let err = load_secret_config_from(Path::new("/nonexistent/secret.json")).unwrap_err();
        assert!(err.contains("/nonexistent/secret.json"));
    }
}
