//! Transcription backends.
//!
//! Every backend implements [`Transcriber`]. The production backend is Replicate's
//! hosted Whisper ([`ReplicateClient`]); [`MockTranscriber`] returns canned text and
//! records what it was asked, for tests and offline demos.

mod mock;
mod replicate;

use async_trait::async_trait;

use super::request::{TranscriptionRequest, TranscriptionResult};

pub use mock::MockTranscriber;
pub use replicate::{ReplicateClient, ReplicateSettings};

/// Turns audio into text. One call = one remote request, no retries.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, TranscriptionError>;
}

/// Why a transcription could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("could not connect to the transcription service: {0}")]
    Connect(String),
    #[error("the transcription service did not respond in time")]
    Timeout,
    #[error("transcription service error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("transcription failed: {0}")]
    PredictionFailed(String),
    #[error("transcription was canceled")]
    Canceled,
    #[error("transcription did not finish within {0} seconds")]
    PollTimeout(u64),
    #[error("unexpected response from the transcription service: {0}")]
    MalformedOutput(String),
    #[error("failed to build transcription request: {0}")]
    Request(String),
}

impl TranscriptionError {
    /// Classifies a transport-level reqwest failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranscriptionError::Timeout
        } else if err.is_connect() {
            TranscriptionError::Connect(err.to_string())
        } else if err.is_builder() {
            TranscriptionError::Request(err.to_string())
        } else {
            TranscriptionError::Connect(format!("network error: {err}"))
        }
    }

    /// Maps an HTTP error status to a human-readable API error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match status {
            401 => "API token is invalid or expired. Check the replicate key in the secrets file.".to_string(),
            402 => "The account behind the API token has run out of credit.".to_string(),
            403 => "The API token is not allowed to run this model.".to_string(),
            404 => "The configured model version does not exist.".to_string(),
            422 => format!("The service rejected the input: {}", body.trim()),
            429 => "Too many requests. The API rate limit was hit, please wait and try again.".to_string(),
            500 | 502 | 503 | 504 => "The service is experiencing issues. Please try again later.".to_string(),
            _ => body.trim().to_string(),
        };
        TranscriptionError::Api { status, message }
    }

    /// Text shown to the user on the page.
    pub fn user_message(&self) -> String {
        match self {
            TranscriptionError::Connect(_) => {
                "Could not reach the transcription service. Check the server's internet connection.".to_string()
            }
            TranscriptionError::Timeout | TranscriptionError::PollTimeout(_) => {
                "The transcription service took too long to answer. Try a shorter recording or try again later.".to_string()
            }
            TranscriptionError::Api { message, .. } => message.clone(),
            TranscriptionError::PredictionFailed(reason) => {
                format!("The model could not transcribe this file: {reason}")
            }
            TranscriptionError::Canceled => "The transcription was canceled.".to_string(),
            TranscriptionError::MalformedOutput(_) | TranscriptionError::Request(_) => {
                "Something went wrong while talking to the transcription service.".to_string()
            }
        }
    }
}
