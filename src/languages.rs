//! Language codes understood by the hosted Whisper model.
//!
//! The catalog is a fixed, ordered list. It feeds the language select box and is
//! used to validate a requested origin language before anything is sent upstream.

/// Every language code Whisper accepts, in display order.
const WHISPER_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "ba", "be", "bg", "bn", "bo", "br", "bs", "ca", "cs", "cy",
    "da", "de", "el", "en", "es", "et", "eu", "fa", "fi", "fo", "fr", "gl", "gu", "ha", "haw",
    "he", "hi", "hr", "ht", "hu", "hy", "id", "is", "it", "ja", "jw", "ka", "kk", "km", "kn",
    "ko", "la", "lb", "ln", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr", "ms", "mt",
    "my", "ne", "nl", "nn", "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "sd", "si",
    "sk", "sl", "sn", "so", "sq", "sr", "su", "sv", "sw", "ta", "te", "tg", "th", "tk", "tl",
    "tr", "tt", "uk", "ur", "uz", "vi", "yi", "yo", "zh",
];

/// Language code pre-selected when the user has not picked one.
pub const DEFAULT_LANGUAGE: &str = "de";

/// Immutable ordered set of supported language codes.
#[derive(Debug, Clone, Copy)]
pub struct LanguageCatalog {
    codes: &'static [&'static str],
}

impl LanguageCatalog {
    /// Returns the catalog of languages supported by Whisper.
    pub fn whisper() -> Self {
        Self {
            codes: WHISPER_LANGUAGES,
        }
    }

    pub fn codes(&self) -> &'static [&'static str] {
        self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Index of `code` in display order, used to pre-select the default entry.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| *c == code)
    }

    /// Normalizes user input (`" DE "` → `"de"`) and returns the catalog entry.
    pub fn resolve(&self, code: &str) -> Option<&'static str> {
        let wanted = code.trim().to_ascii_lowercase();
        self.codes.iter().copied().find(|c| *c == wanted)
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::whisper()
    }
}
