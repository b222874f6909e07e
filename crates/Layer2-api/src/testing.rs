//! Scripted transport for tests
//!
//! ```rust,ignore
//! let mock = Arc::new(MockTransport::new());
//! mock.push_json(200, json!({"ok": true}));
//!
//! let api = ApiManager::with_transport(mock.clone());
//! // ...
//! assert_eq!(mock.calls(), 1);
//! ```

use crate::transport::{OutboundRequest, Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records every request and answers from a queue
///
/// An empty queue answers with a transport error, so an unexpected call fails
/// loudly instead of succeeding with made-up data.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<OutboundRequest>>,
    closes: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_text(status, body.to_string())
    }

    pub fn push_text(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .push_back(Ok(TransportResponse::new(status, body)));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Requests received so far
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<OutboundRequest> {
        self.requests.lock().last().cloned()
    }

    /// Responses queued but not yet consumed
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let described = format!("{} {}", request.method, request.url);
        self.requests.lock().push(request);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::new(format!(
                "no scripted response for {}",
                described
            )))
        })
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
