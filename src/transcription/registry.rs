//! Process-wide cache of transcription clients, one per API token.
//!
//! The first successful construction for a token is kept for the lifetime of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lazily populated `api_token → client` map.
pub struct ClientRegistry<C> {
    clients: Mutex<HashMap<String, Arc<C>>>,
}

impl<C> ClientRegistry<C> {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached client for `api_token`, building it with `connect` on first use.
    ///
    /// A failed construction is not cached; the next call tries again.
    pub fn get_or_connect<F, E>(&self, api_token: &str, connect: F) -> Result<Arc<C>, E>
    where
        F: FnOnce(&str) -> Result<C, E>,
    {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(client) = clients.get(api_token) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(connect(api_token)?);
        clients.insert(api_token.to_string(), Arc::clone(&client));
        tracing::debug!(cached = clients.len(), "Transcription client created");
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .map(|clients| clients.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
