//! Print the supported language codes.

use std::path::Path;

use crate::config::AppConfig;
use crate::languages::LanguageCatalog;

/// Prints one code per line, marking the configured default with `*`.
pub fn handle_languages(config_path: &Path) -> Result<(), anyhow::Error> {
    let default = AppConfig::load_from(config_path)
        .and_then(|config| config.transcriber.options())
        .map(|options| options.default_language)
        .unwrap_or_else(|e| {
            tracing::warn!("Using built-in default language: {e}");
            crate::languages::DEFAULT_LANGUAGE.to_string()
        });

    for code in LanguageCatalog::whisper().codes() {
        if *code == default {
            println!("{code} *");
        } else {
            println!("{code}");
        }
    }

    Ok(())
}
