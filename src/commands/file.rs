//! Transcribe a local audio file without the web UI.
//!
//! Uses the same options, validation and Replicate client as the `serve` command.

use std::path::{Path, PathBuf};

use crate::config::secrets::REPLICATE_TOKEN_ENV;
use crate::config::{AppConfig, Secrets};
use crate::languages::LanguageCatalog;
use crate::transcription::{self, Transcriber, TranscriptionRequest};

/// Handles transcription of a pre-recorded audio file.
///
/// # Arguments
/// * `file` - Path to the audio file to transcribe
/// * `language` - Origin language code, if known
/// * `translate` - Overrides the configured translate-to-English switch
/// * `output_file` - Optional file path to write output to instead of stdout
pub async fn handle_file(
    config_path: &Path,
    file: PathBuf,
    language: Option<String>,
    translate: Option<bool>,
    output_file: Option<String>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== transcribe File Command ===");

    if !file.exists() {
        return Err(anyhow::anyhow!("Audio file not found: {}", file.display()));
    }

    let config = AppConfig::load_from(config_path)?;
    let secrets_path = config.secrets_path(config_path);
    let secrets = Secrets::load(&secrets_path)?;
    let options = config.transcriber.options()?;

    let file_name = file
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    if !options.accepts(&file_name) {
        return Err(anyhow::anyhow!(
            "Unsupported file type '{file_name}'. Accepted: {}",
            options.accept_attribute()
        ));
    }

    let language = match language {
        Some(code) => Some(
            LanguageCatalog::whisper()
                .resolve(&code)
                .ok_or_else(|| anyhow::anyhow!("Unsupported language '{code}'. Run 'transcribe languages' for the list"))?
                .to_string(),
        ),
        None => None,
    };

    let api_token = secrets.replicate_token().ok_or_else(|| {
        anyhow::anyhow!(
            "No Replicate API token. Set {REPLICATE_TOKEN_ENV} or add `replicate` under [api_keys] in {}",
            secrets_path.display()
        )
    })?;

    let audio = std::fs::read(&file)
        .map_err(|e| anyhow::anyhow!("Failed to read audio file: {e}"))?;
    let request = TranscriptionRequest::new(audio, file_name, options.whisper_model)
        .with_translate(translate.unwrap_or(options.translate_to_english))
        .with_language(language);

    let client =
        transcription::replicate_client(&api_token, &options.model_version, &config.replicate.settings())?;

    let result = client.transcribe(&request).await.map_err(|e| {
        tracing::error!("Transcription failed: {e}");
        anyhow::anyhow!("Transcription failed: {}", e.user_message())
    })?;

    if let Some(translation) = &result.translation {
        tracing::debug!("Translation: {translation}");
    }

    // file > stdout
    if let Some(file_path) = output_file {
        std::fs::write(&file_path, &result.transcription)
            .map_err(|e| anyhow::anyhow!("Failed to write to file '{file_path}': {e}"))?;
        tracing::debug!("Transcribed text written to file: {file_path}");
    } else {
        println!("{}", result.transcription);
    }

    Ok(())
}
