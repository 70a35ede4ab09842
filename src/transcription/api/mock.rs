//! In-process transcriber with canned answers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Transcriber, TranscriptionError};
use crate::transcription::request::{TranscriptionRequest, TranscriptionResult};

#[derive(Clone)]
enum Reply {
    Text(TranscriptionResult),
    Fail(String),
}

/// Answers calls from a queue of canned replies and remembers what it was asked.
///
/// Replies are used in order; the last one repeats once the queue runs dry.
pub struct MockTranscriber {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<TranscriptionRequest>>,
}

impl MockTranscriber {
    fn starting_with(reply: Reply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([reply])),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(transcription: impl Into<String>) -> Self {
        Self::with_result(TranscriptionResult::new(transcription))
    }

    pub fn with_result(result: TranscriptionResult) -> Self {
        Self::starting_with(Reply::Text(result))
    }

    /// Every call fails as if the remote prediction had failed.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::starting_with(Reply::Fail(reason.into()))
    }

    /// Queues a successful reply after the ones already queued.
    pub fn then_replying(self, transcription: impl Into<String>) -> Self {
        self.then(Reply::Text(TranscriptionResult::new(transcription)))
    }

    /// Queues a failing reply after the ones already queued.
    pub fn then_failing(self, reason: impl Into<String>) -> Self {
        self.then(Reply::Fail(reason.into()))
    }

    fn then(self, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    fn next_reply(&self) -> Option<Reply> {
        let mut replies = self.replies.lock().ok()?;
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TranscriptionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        tracing::debug!(?request, "Mock transcription");

        match self.next_reply() {
            Some(Reply::Text(result)) => Ok(result),
            Some(Reply::Fail(reason)) => Err(TranscriptionError::PredictionFailed(reason)),
            None => Err(TranscriptionError::Request("mock reply queue unavailable".to_string())),
        }
    }
}
