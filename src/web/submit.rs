//! The transcribe action: validate the upload, call the transcriber, store the result.

use axum::http::StatusCode;

use super::state::AppState;
use crate::session::SessionId;
use crate::transcription::{TranscriptionError, TranscriptionRequest};

/// Uploaded file as received from the form.
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Options submitted next to the file.
#[derive(Default)]
pub struct SubmitForm {
    pub upload: Option<Upload>,
    pub language_known: bool,
    pub language: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Please log in first.")]
    Unauthenticated,
    #[error("Please upload an audio file first.")]
    MissingFile,
    #[error("Unsupported file type '{file_name}'. Accepted: {accepted}")]
    UnsupportedFormat { file_name: String, accepted: String },
    #[error("Unsupported language '{0}'.")]
    UnsupportedLanguage(String),
    #[error(transparent)]
    Remote(#[from] TranscriptionError),
}

impl SubmitError {
    pub fn status(&self) -> StatusCode {
        match self {
            SubmitError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SubmitError::MissingFile | SubmitError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            SubmitError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            SubmitError::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message rendered on the page.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Remote(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Builds the request, or explains why it cannot be built. Never touches the network.
pub fn build_request(state: &AppState, form: SubmitForm) -> Result<TranscriptionRequest, SubmitError> {
    let upload = form
        .upload
        .filter(|u| !u.file_name.trim().is_empty() && !u.bytes.is_empty())
        .ok_or(SubmitError::MissingFile)?;

    if !state.options.accepts(&upload.file_name) {
        return Err(SubmitError::UnsupportedFormat {
            file_name: upload.file_name,
            accepted: state.options.accept_attribute(),
        });
    }

    let language = if form.language_known {
        let requested = form.language.unwrap_or_default();
        let code = state
            .catalog
            .resolve(&requested)
            .ok_or(SubmitError::UnsupportedLanguage(requested))?;
        Some(code.to_string())
    } else {
        None
    };

    Ok(
        TranscriptionRequest::new(upload.bytes, upload.file_name, state.options.whisper_model)
            .with_translate(state.options.translate_to_english)
            .with_language(language),
    )
}

/// Runs one submission for `session`.
///
/// The session's previous result is cleared before the remote call starts and the
/// new result is stored only if no newer submission began in the meantime.
pub async fn submit(state: &AppState, session: SessionId, form: SubmitForm) -> Result<(), SubmitError> {
    let authenticated = state.sessions.with(session, |s| s.auth.is_authenticated());
    if state.options.require_auth && !authenticated {
        return Err(SubmitError::Unauthenticated);
    }

    let request = build_request(state, form)?;
    tracing::info!(session = %session, ?request, "Transcription submitted");

    let ticket = state.sessions.with(session, |s| s.result.begin());

    let result = state.transcriber.transcribe(&request).await.map_err(|e| {
        tracing::error!(session = %session, "Transcription failed: {e}");
        SubmitError::from(e)
    })?;

    let stored = state
        .sessions
        .with(session, |s| s.result.complete(ticket, result));
    if !stored {
        tracing::info!(session = %session, "Result discarded, a newer submission is pending");
    }

    Ok(())
}
