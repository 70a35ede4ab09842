use std::sync::Arc;

use crate::auth::CredentialGate;
use crate::languages::LanguageCatalog;
use crate::session::SessionStore;
use crate::transcription::{TranscriberOptions, Transcriber};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub transcriber: Arc<dyn Transcriber>,
    pub options: Arc<TranscriberOptions>,
    pub gate: Arc<CredentialGate>,
    pub sessions: SessionStore,
    pub catalog: LanguageCatalog,
}

impl AppState {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        options: TranscriberOptions,
        gate: CredentialGate,
    ) -> Self {
        Self {
            transcriber,
            options: Arc::new(options),
            gate: Arc::new(gate),
            sessions: SessionStore::default(),
            catalog: LanguageCatalog::whisper(),
        }
    }

    /// Replaces the default session store, e.g. with configured limits.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}
