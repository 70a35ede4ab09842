//! Behavior switches of the upload form.
//!
//! The form used to exist as two diverging copies (translate vs. transcribe). Both
//! are now presets of one [`TranscriberOptions`] value.

use serde::Deserialize;
use std::collections::BTreeSet;

use super::model::{ModelVersion, WhisperModel, TRANSCRIBE_VERSION, TRANSLATE_VERSION};
use super::request::file_extension;
use crate::languages::DEFAULT_LANGUAGE;

/// Named starting point for [`TranscriberOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Translate to English, no login, wav/mp3/ogg/mp4
    #[default]
    Translate,
    /// Same-language transcription behind a login, wav/mp3/m4a, clear after download
    Transcribe,
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translate => write!(f, "translate"),
            Self::Transcribe => write!(f, "transcribe"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriberOptions {
    pub require_auth: bool,
    pub translate_to_english: bool,
    /// Lower-case extensions without the dot
    pub accepted_extensions: BTreeSet<String>,
    pub model_version: ModelVersion,
    pub whisper_model: WhisperModel,
    /// Drop the stored result once it has been downloaded
    pub clear_after_download: bool,
    pub default_language: String,
}

impl TranscriberOptions {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Translate => Self {
                require_auth: false,
                translate_to_english: true,
                accepted_extensions: extensions(&["wav", "mp3", "ogg", "mp4"]),
                model_version: pinned(TRANSLATE_VERSION),
                whisper_model: WhisperModel::LargeV2,
                clear_after_download: false,
                default_language: DEFAULT_LANGUAGE.to_string(),
            },
            Preset::Transcribe => Self {
                require_auth: true,
                translate_to_english: false,
                accepted_extensions: extensions(&["wav", "mp3", "m4a"]),
                model_version: pinned(TRANSCRIBE_VERSION),
                whisper_model: WhisperModel::LargeV2,
                clear_after_download: true,
                default_language: DEFAULT_LANGUAGE.to_string(),
            },
        }
    }

    /// True if the file name carries one of the accepted extensions.
    pub fn accepts(&self, file_name: &str) -> bool {
        file_extension(file_name).is_some_and(|ext| self.accepted_extensions.contains(&ext))
    }

    /// Value for the `accept` attribute of the file input, e.g. `.mp3,.wav`.
    pub fn accept_attribute(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for TranscriberOptions {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

fn extensions(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|e| e.to_string()).collect()
}

fn pinned(version: &str) -> ModelVersion {
    ModelVersion {
        owner: "openai".to_string(),
        name: "whisper".to_string(),
        version: version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::model::WHISPER_MODEL;

    #[test]
    fn test_presets_differ_where_expected() {
        let translate = TranscriberOptions::preset(Preset::Translate);
        let transcribe = TranscriberOptions::preset(Preset::Transcribe);

        assert!(translate.translate_to_english);
        assert!(!translate.require_auth);
        assert!(!transcribe.translate_to_english);
        assert!(transcribe.require_auth);
        assert!(transcribe.clear_after_download);
        assert_ne!(translate.model_version, transcribe.model_version);
        assert_eq!(
            translate.model_version,
            ModelVersion::new(WHISPER_MODEL, TRANSLATE_VERSION).unwrap()
        );
    }

    #[test]
    fn test_accepts_checks_extension_case_insensitively() {
        let opts = TranscriberOptions::preset(Preset::Translate);
        assert!(opts.accepts("memo.OGG"));
        assert!(opts.accepts("clip.mp4"));
        assert!(!opts.accepts("memo.m4a"));
        assert!(!opts.accepts("memo"));

        let opts = TranscriberOptions::preset(Preset::Transcribe);
        assert!(opts.accepts("memo.m4a"));
        assert!(!opts.accepts("memo.ogg"));
    }

    #[test]
    fn test_accept_attribute() {
        let opts = TranscriberOptions::preset(Preset::Transcribe);
        assert_eq!(opts.accept_attribute(), ".m4a,.mp3,.wav");
    }
}
