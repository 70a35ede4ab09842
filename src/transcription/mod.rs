//! Transcription of uploaded audio through a hosted Whisper model.
//!
//! This module owns the request/result types, the form options, the backend trait
//! and the key-scoped client registry. It knows nothing about HTTP sessions.

pub mod api;
pub mod model;
pub mod options;
pub mod registry;
pub mod request;

use std::sync::{Arc, LazyLock};

pub use api::{MockTranscriber, ReplicateClient, ReplicateSettings, Transcriber, TranscriptionError};
pub use model::{ModelVersion, WhisperModel};
pub use options::{Preset, TranscriberOptions};
pub use registry::ClientRegistry;
pub use request::{TranscriptionRequest, TranscriptionResult};

static REPLICATE_CLIENTS: LazyLock<ClientRegistry<ReplicateClient>> =
    LazyLock::new(ClientRegistry::new);

/// Returns the process-wide Replicate client for `api_token`, creating it on first use.
///
/// Later calls with the same token get the same client, whatever `version` and
/// `settings` they pass.
pub fn replicate_client(
    api_token: &str,
    version: &ModelVersion,
    settings: &ReplicateSettings,
) -> Result<Arc<ReplicateClient>, TranscriptionError> {
    REPLICATE_CLIENTS.get_or_connect(api_token, |token| {
        ReplicateClient::connect(token, version.clone(), settings.clone())
    })
}
