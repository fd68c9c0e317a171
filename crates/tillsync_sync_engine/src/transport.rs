//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tillsync_sync_protocol::{PingResponse, PullRequest, PullResponse, PushRequest, PushResponse};

/// A sync transport carries requests to the Cloud.
///
/// This trait abstracts the network layer so the engine can run against
/// HTTP, an in-process Cloud handler, or a mock.
pub trait SyncTransport: Send + Sync {
    /// Pushes a batch of records.
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse>;

    /// Pulls records of one model.
    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse>;

    /// Checks that the Cloud accepts the token.
    fn ping(&self) -> SyncResult<PingResponse>;
}

impl<T: SyncTransport + ?Sized> SyncTransport for Arc<T> {
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        (**self).push(request)
    }

    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
        (**self).pull(request)
    }

    fn ping(&self) -> SyncResult<PingResponse> {
        (**self).ping()
    }
}

/// A mock transport for testing.
///
/// Responses are set ahead of time; every request is recorded. Queued
/// failures are returned before any response.
#[derive(Debug)]
pub struct MockTransport {
    online: AtomicBool,
    push_response: Mutex<Option<PushResponse>>,
    pull_response: Mutex<Option<PullResponse>>,
    failures: Mutex<VecDeque<SyncError>>,
    pushes: Mutex<Vec<PushRequest>>,
    pulls: Mutex<Vec<PullRequest>>,
    pings: AtomicUsize,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            push_response: Mutex::new(None),
            pull_response: Mutex::new(None),
            failures: Mutex::new(VecDeque::new()),
            pushes: Mutex::new(Vec::new()),
            pulls: Mutex::new(Vec::new()),
            pings: AtomicUsize::new(0),
        }
    }

    /// Sets the push response.
    pub fn set_push_response(&self, response: PushResponse) {
        *self.push_response.lock() = Some(response);
    }

    /// Sets the pull response.
    pub fn set_pull_response(&self, response: PullResponse) {
        *self.pull_response.lock() = Some(response);
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().push_back(error);
    }

    /// Simulates losing the connection. Offline calls fail as retryable
    /// network errors.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns every push request received.
    pub fn pushes(&self) -> Vec<PushRequest> {
        self.pushes.lock().clone()
    }

    /// Returns every pull request received.
    pub fn pulls(&self) -> Vec<PullRequest> {
        self.pulls.lock().clone()
    }

    /// Number of push calls, failed ones included.
    pub fn push_calls(&self) -> usize {
        self.pushes.lock().len()
    }

    /// Number of pull calls, failed ones included.
    pub fn pull_calls(&self) -> usize {
        self.pulls.lock().len()
    }

    /// Number of ping calls.
    pub fn ping_calls(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    fn check(&self) -> SyncResult<()> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(SyncError::network_retryable("connection refused"));
        }
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for MockTransport {
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        self.pushes.lock().push(request.clone());
        self.check()?;
        self.push_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock push response set".into()))
    }

    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
        self.pulls.lock().push(request.clone());
        self.check()?;
        self.pull_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock pull response set".into()))
    }

    fn ping(&self) -> SyncResult<PingResponse> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(PingResponse::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_calls_are_retryable() {
        let transport = MockTransport::new();
        transport.set_online(false);

        let err = transport.ping().unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.ping_calls(), 1);

        transport.set_online(true);
        assert!(transport.ping().unwrap().success);
    }

    #[test]
    fn queued_failures_come_first() {
        let transport = MockTransport::new();
        transport.set_push_response(PushResponse::success("Order", 1, 0, Vec::new()));
        transport.fail_next(SyncError::Auth("invalid token".into()));

        let request = PushRequest::new("Order", Vec::new());
        assert!(matches!(transport.push(&request), Err(SyncError::Auth(_))));
        assert!(transport.push(&request).unwrap().success);
        assert_eq!(transport.push_calls(), 2);
    }

    #[test]
    fn missing_response_is_a_protocol_error() {
        let transport = MockTransport::new();
        let err = transport.pull(&PullRequest::new("Category", None)).unwrap_err();
        assert_eq!(err.kind(), "protocol");
        assert_eq!(transport.pulls()[0].model, "Category");
    }

    #[test]
    fn shared_transport_records_through_arc() {
        let transport = Arc::new(MockTransport::new());
        let shared: Arc<MockTransport> = Arc::clone(&transport);
        shared.ping().unwrap();
        assert_eq!(transport.ping_calls(), 1);
    }
}
