//! Scripted generation backend.

use crate::backend::{Generation, GenerationBackend, GenerationRequest};
use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A backend that replays queued generations in order.
///
/// When the queue is exhausted it fails with the configured error
/// ([`LlmError::EmptyResponse`] by default). Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Generation, LlmError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    exhausted: Option<LlmError>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    /// Creates a backend replaying `generations`.
    #[must_use]
    pub fn new(generations: impl IntoIterator<Item = Generation>) -> Self {
        Self {
            script: Mutex::new(generations.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Creates a backend that always fails with `error`.
    #[must_use]
    pub fn failing(error: LlmError) -> Self {
        Self {
            exhausted: Some(error),
            ..Self::default()
        }
    }

    /// Queues a failure after the generations already queued.
    #[must_use]
    pub fn then_fail(self, error: LlmError) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
        self
    }

    /// Delays every response, to exercise caller deadlines.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, Report<LlmError>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(Ok(generation)) => Ok(generation),
            Some(Err(error)) => Err(error.into()),
            None => Err(self
                .exhausted
                .clone()
                .unwrap_or(LlmError::EmptyResponse)
                .into()),
        }
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}
