//! Hosted Whisper model identifiers.
//!
//! A hosted model is addressed by `owner/name` plus an immutable version hash. The
//! Whisper checkpoint size is a separate input passed to that version.

use std::fmt;

/// Replicate model the transcriber talks to.
pub const WHISPER_MODEL: &str = "openai/whisper";

/// Version used by the translate-to-English preset.
pub const TRANSLATE_VERSION: &str =
    "91ee9c0c3df30478510ff8c8a3a545add1ad0259ad3a9f78fba57fbc05ee64f7";

/// Version used by the same-language transcription preset.
pub const TRANSCRIBE_VERSION: &str =
    "30414ee7c4fffc37e260fcab7842b5be470b9b840f2b608f5baa9bbef9a259ed";

/// Whisper checkpoint requested from the hosted model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    LargeV1,
    /// Default for both presets
    #[default]
    LargeV2,
}

impl WhisperModel {
    /// Returns the value sent as the `model` input
    pub fn id(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::LargeV1 => "large-v1",
            WhisperModel::LargeV2 => "large-v2",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "tiny" => Some(WhisperModel::Tiny),
            "base" => Some(WhisperModel::Base),
            "small" => Some(WhisperModel::Small),
            "medium" => Some(WhisperModel::Medium),
            "large-v1" => Some(WhisperModel::LargeV1),
            "large-v2" => Some(WhisperModel::LargeV2),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            WhisperModel::Tiny,
            WhisperModel::Base,
            WhisperModel::Small,
            WhisperModel::Medium,
            WhisperModel::LargeV1,
            WhisperModel::LargeV2,
        ]
    }

    pub fn available_ids() -> Vec<&'static str> {
        Self::all().iter().map(|m| m.id()).collect()
    }
}

/// An immutable snapshot of a hosted model: `owner/name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelVersion {
    pub owner: String,
    pub name: String,
    pub version: String,
}

impl ModelVersion {
    /// Parses `owner/name` and pairs it with a version hash.
    pub fn new(model: &str, version: &str) -> anyhow::Result<Self> {
        let (owner, name) = model
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| {
                anyhow::anyhow!("Invalid model '{model}'. Expected 'owner/name'")
            })?;

        let version = version.trim();
        if version.is_empty() || !version.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!(
                "Invalid model version '{version}'. Expected a hexadecimal hash"
            ));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version: version.to_ascii_lowercase(),
        })
    }

    /// Shortened form for log lines and the page footer.
    pub fn short(&self) -> String {
        let hash: String = self.version.chars().take(8).collect();
        format!("{}/{}:{}", self.owner, self.name, hash)
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.owner, self.name, self.version)
    }
}
