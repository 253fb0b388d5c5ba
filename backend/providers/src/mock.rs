use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use codebuddy_core::{Completion, CompletionClient, CompletionRequest, ModelError};

/// A completion client that returns canned responses and records every request.
///
/// Queued replies are consumed first, in order; after that the fixed
/// response (or `"Mock response"`) is returned.
#[derive(Default)]
pub struct MockClient {
    queued: Mutex<VecDeque<Result<String, String>>>,
    fixed_response: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, content: impl Into<String>) {
        self.lock_queue().push_back(Ok(content.into()));
    }

    /// Queue a provider failure (HTTP 500 with `body`).
    pub fn push_failure(&self, body: impl Into<String>) {
        self.lock_queue().push_back(Err(body.into()));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.queued.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        let model = request.model.clone();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self.lock_queue().pop_front();
        match next {
            Some(Ok(content)) => Ok(Completion {
                model: Some(model),
                ..Completion::text(content)
            }),
            Some(Err(body)) => Err(ModelError::Http {
                provider: "mock".to_string(),
                status: 500,
                body,
            }),
            None => Ok(Completion {
                model: Some(model),
                ..Completion::text(
                    self.fixed_response
                        .clone()
                        .unwrap_or_else(|| "Mock response".to_string()),
                )
            }),
        }
    }
}
