//! Credentials read at startup: login passwords and the Replicate API token.
//!
//! The file is only ever read. `REPLICATE_API_TOKEN` in the environment takes
//! precedence over the token in the file.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable that overrides `[api_keys] replicate`.
pub const REPLICATE_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub replicate: Option<String>,
}

/// Contents of `secrets.toml`.
#[derive(Default, Deserialize)]
pub struct Secrets {
    /// username → password
    #[serde(default)]
    pub passwords: HashMap<String, String>,
    #[serde(default)]
    pub api_keys: ApiKeys,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("users", &self.passwords.len())
            .field("replicate_key", &self.api_keys.replicate.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Reads the secrets file. A missing file yields empty secrets.
    ///
    /// # Errors
    /// - If the file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!("Secrets file not found: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read secrets file {}: {e}", path.display()))?;
        let secrets: Secrets = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid secrets file {}: {e}", path.display()))?;

        tracing::debug!(?secrets, "Secrets loaded");
        Ok(secrets)
    }

    /// Replicate token from the environment, falling back to the file.
    pub fn replicate_token(&self) -> Option<String> {
        self.replicate_token_with(std::env::var(REPLICATE_TOKEN_ENV).ok())
    }

    fn replicate_token_with(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .or_else(|| self.api_keys.replicate.clone())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_passwords_and_api_keys() {
        let secrets: Secrets = toml::from_str(
            r#"
            [passwords]
            alice = "wonderland"

            [api_keys]
            replicate = "r8_file"
            "#,
        )
        .unwrap();

        assert_eq!(secrets.passwords.get("alice").map(String::as_str), Some("wonderland"));
        assert_eq!(secrets.replicate_token_with(None).as_deref(), Some("r8_file"));
        assert_eq!(
            secrets.replicate_token_with(Some("r8_env".to_string())).as_deref(),
            Some("r8_env")
        );
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let secrets: Secrets = toml::from_str("[api_keys]\nreplicate = \"  \"").unwrap();
        assert_eq!(secrets.replicate_token_with(None), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Secrets::load(&dir.path().join("absent.toml")).unwrap();
        assert!(secrets.passwords.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "[passwords\nalice = 1").unwrap();
        assert!(Secrets::load(&path).is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let secrets: Secrets = toml::from_str(
            "[passwords]\nbob = \"hunter2\"\n[api_keys]\nreplicate = \"r8_secret\"",
        )
        .unwrap();
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("r8_secret"));
    }
}
