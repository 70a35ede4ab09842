//! Per-browser session state: login status and at most one transcription result.
//!
//! Sessions live only in memory and are identified by a random id kept in a cookie.
//! A session that sees no request for the idle timeout is dropped together with its
//! result, and the store never holds more than `max_sessions` entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::auth::AuthState;
use crate::transcription::TranscriptionResult;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that a request started; needed to store its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Holds zero or one result.
///
/// Every new request bumps the generation and empties the slot. A result is only
/// accepted from the request holding the current generation, so a slow earlier
/// request can never overwrite the answer of a later one.
#[derive(Debug, Default)]
pub struct ResultSlot {
    generation: u64,
    result: Option<TranscriptionResult>,
}

impl ResultSlot {
    pub fn get(&self) -> Option<&TranscriptionResult> {
        self.result.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }

    pub fn clear(&mut self) {
        self.result = None;
    }

    /// Stores `result`, dropping whatever was there.
    pub fn replace(&mut self, result: TranscriptionResult) -> Option<TranscriptionResult> {
        self.result.replace(result)
    }

    /// Removes and returns the stored result.
    pub fn take(&mut self) -> Option<TranscriptionResult> {
        self.result.take()
    }

    /// Marks the start of a new request: clears the slot and supersedes older tickets.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.result = None;
        Ticket(self.generation)
    }

    /// Stores `result` if `ticket` is still current. Returns whether it was stored.
    pub fn complete(&mut self, ticket: Ticket, result: TranscriptionResult) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "Dropping result of superseded request"
            );
            return false;
        }
        self.replace(result);
        true
    }
}

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
pub struct Session {
    pub auth: AuthState,
    pub result: ResultSlot,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            auth: AuthState::default(),
            result: ResultSlot::default(),
            last_seen: Instant::now(),
        }
    }
}

type SessionMap = HashMap<SessionId, Session>;

/// All live sessions. Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<SessionMap>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionMap> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks `id` as seen. False if it is unknown or has gone idle (and is now removed).
    fn touch(&self, sessions: &mut SessionMap, id: SessionId, now: Instant) -> bool {
        let idle = match sessions.get(&id) {
            Some(session) => now.saturating_duration_since(session.last_seen) >= self.idle_timeout,
            None => return false,
        };
        if idle {
            sessions.remove(&id);
            return false;
        }
        if let Some(session) = sessions.get_mut(&id) {
            session.last_seen = now;
        }
        true
    }

    fn sweep(&self, sessions: &mut SessionMap, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_seen) < self.idle_timeout);
        before - sessions.len()
    }

    /// Returns `id` if it names a live session. Never creates one.
    pub fn lookup(&self, id: Option<SessionId>) -> Option<SessionId> {
        let id = id?;
        let mut sessions = self.lock();
        self.touch(&mut sessions, id, Instant::now()).then_some(id)
    }

    /// Returns `id` if it names a live session, otherwise opens a new one.
    ///
    /// Opening a session first drops idle ones and, at capacity, the least recently seen.
    pub fn resolve(&self, id: Option<SessionId>) -> (SessionId, bool) {
        let now = Instant::now();
        let mut sessions = self.lock();
        if let Some(id) = id {
            if self.touch(&mut sessions, id, now) {
                return (id, false);
            }
        }

        self.sweep(&mut sessions, now);
        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session = %oldest, "Session store full, dropped least recent session");
            }
        }

        let id = SessionId::new();
        sessions.insert(id, Session::default());
        tracing::debug!(session = %id, live = sessions.len(), "Session created");
        (id, true)
    }

    /// Runs `f` on the session. Must not be held across an await.
    pub fn with<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.lock();
        let session = sessions.entry(id).or_default();
        f(session)
    }

    /// Drops every session idle for longer than the timeout. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        self.sweep(&mut sessions, now)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
