//! Request and result types exchanged with a [`Transcriber`](super::Transcriber).

use std::path::Path;

use super::model::WhisperModel;

/// One transcription job, built fresh for every submission and never persisted.
#[derive(Clone)]
pub struct TranscriptionRequest {
    /// Raw bytes of the uploaded audio container
    pub audio: Vec<u8>,
    /// Original file name, used to pick a MIME type
    pub file_name: String,
    pub model: WhisperModel,
    /// Ask the model to translate into English
    pub translate: bool,
    /// Origin language, when the user knows it
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(audio: Vec<u8>, file_name: impl Into<String>, model: WhisperModel) -> Self {
        Self {
            audio,
            file_name: file_name.into(),
            model,
            translate: false,
            language: None,
        }
    }

    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// MIME type derived from the file extension.
    pub fn mime_type(&self) -> &'static str {
        file_extension(&self.file_name)
            .map(|ext| mime_for_extension(&ext))
            .unwrap_or("application/octet-stream")
    }
}

impl std::fmt::Debug for TranscriptionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionRequest")
            .field("audio_bytes", &self.audio.len())
            .field("file_name", &self.file_name)
            .field("model", &self.model.id())
            .field("translate", &self.translate)
            .field("language", &self.language)
            .finish()
    }
}

/// Text returned by the hosted model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub transcription: String,
    /// English translation, present when translation was requested
    pub translation: Option<String>,
    pub detected_language: Option<String>,
}

impl TranscriptionResult {
    pub fn new(transcription: impl Into<String>) -> Self {
        Self {
            transcription: transcription.into(),
            translation: None,
            detected_language: None,
        }
    }
}

/// Lower-cased extension of `file_name` without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "mp4" => "audio/mp4",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}
