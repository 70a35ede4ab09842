//! Username/password gate in front of the transcription page.
//!
//! Credentials come from the `[passwords]` table of the secrets file. The check is a
//! plain lookup and string comparison: it keeps casual visitors out of a demo and is
//! not meant to be a security boundary.

use std::collections::HashMap;

/// Message rendered under the login form after a rejected attempt.
pub const REJECTED_MESSAGE: &str = "User not known or password incorrect";

/// Static username → password table.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    passwords: HashMap<String, String>,
}

impl CredentialGate {
    pub fn new(passwords: HashMap<String, String>) -> Self {
        Self { passwords }
    }

    /// Returns true only if `username` is known and `password` matches it exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.passwords
            .get(username)
            .is_some_and(|expected| expected == password)
    }

    pub fn user_count(&self) -> usize {
        self.passwords.len()
    }
}

/// Authentication state held by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No credentials submitted yet.
    #[default]
    Unauthenticated,
    /// Last submitted credentials were wrong.
    Rejected,
    /// Terminal for the session.
    Authenticated,
}

impl AuthState {
    /// Applies a login attempt. Once authenticated, further attempts change nothing.
    pub fn submit(self, gate: &CredentialGate, username: &str, password: &str) -> Self {
        if self == AuthState::Authenticated {
            return self;
        }
        if gate.authenticate(username, password) {
            tracing::info!(user = %username, "Login accepted");
            AuthState::Authenticated
        } else {
            tracing::warn!(user = %username, "Login rejected");
            AuthState::Rejected
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == AuthState::Authenticated
    }
}
