//! Configuration file management for transcribe.
//!
//! This module handles loading application configuration from TOML files.
//! Configuration is stored in the user's config directory unless a path is given.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::languages::LanguageCatalog;
use crate::transcription::{ModelVersion, Preset, ReplicateSettings, TranscriberOptions, WhisperModel};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, e.g. "127.0.0.1" or "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Minutes without a request before a browser session and its result are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
    /// Upper bound on live sessions; the least recently seen one makes room
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_max_upload_mb() -> usize {
    200
}

fn default_session_idle_minutes() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            session_idle_minutes: default_session_idle_minutes(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl ServerConfig {
    /// Request body limit in bytes. Absurd values saturate instead of wrapping.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }
}

/// Form behavior. Starts from `preset`; every other field overrides the preset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriberConfig {
    /// "translate" (translate to English, open access) or "transcribe" (same language, login)
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub require_auth: Option<bool>,
    #[serde(default)]
    pub translate_to_english: Option<bool>,
    /// File extensions the upload control accepts, without dots
    #[serde(default)]
    pub accepted_extensions: Option<Vec<String>>,
    /// Hosted model as "owner/name"
    #[serde(default)]
    pub model: Option<String>,
    /// Immutable version hash of the hosted model
    #[serde(default)]
    pub model_version: Option<String>,
    /// Whisper checkpoint: tiny, base, small, medium, large-v1, large-v2
    #[serde(default)]
    pub whisper_model: Option<String>,
    #[serde(default)]
    pub clear_after_download: Option<bool>,
    /// Language pre-selected in the origin language box
    #[serde(default)]
    pub default_language: Option<String>,
}

impl TranscriberConfig {
    /// Resolves the preset and overrides into validated options.
    ///
    /// # Errors
    /// - If the model or version string is malformed
    /// - If the Whisper model is unknown
    /// - If the default language is not in the catalog
    /// - If the extension list is empty
    pub fn options(&self) -> anyhow::Result<TranscriberOptions> {
        let mut options = TranscriberOptions::preset(self.preset);

        if let Some(require_auth) = self.require_auth {
            options.require_auth = require_auth;
        }
        if let Some(translate) = self.translate_to_english {
            options.translate_to_english = translate;
        }
        if let Some(clear) = self.clear_after_download {
            options.clear_after_download = clear;
        }

        if let Some(extensions) = &self.accepted_extensions {
            let extensions: BTreeSet<String> = extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
            if extensions.is_empty() {
                return Err(anyhow::anyhow!("accepted_extensions must not be empty"));
            }
            options.accepted_extensions = extensions;
        }

        if self.model.is_some() || self.model_version.is_some() {
            let current = &options.model_version;
            let model = self
                .model
                .clone()
                .unwrap_or_else(|| format!("{}/{}", current.owner, current.name));
            let version = self
                .model_version
                .clone()
                .unwrap_or_else(|| current.version.clone());
            options.model_version = ModelVersion::new(&model, &version)?;
        }

        if let Some(id) = &self.whisper_model {
            options.whisper_model = WhisperModel::from_id(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown whisper_model '{id}'. Available: {}",
                    WhisperModel::available_ids().join(", ")
                )
            })?;
        }

        if let Some(language) = &self.default_language {
            options.default_language = language.clone();
        }
        let catalog = LanguageCatalog::whisper();
        let resolved = catalog.resolve(&options.default_language).ok_or_else(|| {
            anyhow::anyhow!(
                "default_language '{}' is not a supported language code",
                options.default_language
            )
        })?;
        options.default_language = resolved.to_string();

        Ok(options)
    }
}

/// Replicate API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Milliseconds between prediction status checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.replicate.com".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    600
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ReplicateConfig {
    pub fn settings(&self) -> ReplicateSettings {
        ReplicateSettings {
            base_url: self.base_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Secrets file; relative paths are resolved against the config file's directory
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub replicate: ReplicateConfig,
}

impl AppConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config_content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {e}", path.display()))?;
        let config: AppConfig = toml::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Location of the secrets file for a config loaded from `config_path`.
    pub fn secrets_path(&self, config_path: &Path) -> PathBuf {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.secrets_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join("secrets.toml"),
        }
    }
}

/// Directory holding `transcribe.toml` and `secrets.toml`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".config").join("transcribe"))
}

/// Retrieves the path to the default config file.
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("transcribe.toml"))
}
