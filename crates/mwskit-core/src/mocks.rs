//! Deterministic test doubles for the clock and the transport.
//!
//! Both are cheap to clone; clones share state, so a test can keep a handle
//! while the client owns another.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;

use crate::clock::Clock;
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Controllable clock. `sleep` returns immediately, advances time by the
/// requested duration and records it.
///
/// ```
/// use mwskit_core::clock::Clock;
/// use mwskit_core::mocks::MockClock;
/// use std::time::Duration;
/// use time::macros::datetime;
///
/// let clock = MockClock::new(datetime!(2024-01-01 00:00:00 UTC));
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), datetime!(2024-01-01 00:00:10 UTC));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Arc<Mutex<MockClockState>>,
}

#[derive(Debug)]
struct MockClockState {
    now: OffsetDateTime,
    sleeps: Vec<Duration>,
}

impl MockClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockClockState {
                now: start,
                sleeps: Vec::new(),
            })),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration;
    }

    pub fn set(&self, now: OffsetDateTime) {
        self.lock().now = now;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockClockState> {
        self.inner
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        self.lock().now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        {
            let mut state = self.lock();
            state.now += duration;
            state.sleeps.push(duration);
        }
        Box::pin(std::future::ready(()))
    }
}

/// Transport that replays queued responses and records every request.
///
/// When the queue is empty it answers with an empty `200` XML body.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpClient {
    inner: Arc<Mutex<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    responses: VecDeque<Result<HttpResponse, HttpError>>,
    requests: Vec<HttpRequest>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.lock().responses.push_back(Ok(response));
        self
    }

    pub fn push_error(&self, error: HttpError) -> &Self {
        self.lock().responses.push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.inner
            .lock()
            .expect("ScriptedHttpClient mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let outcome = {
            let mut state = self.lock();
            state.requests.push(request);
            state
                .responses
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::ok_xml("<Empty/>")))
        };
        Box::pin(std::future::ready(outcome))
    }
}
