//! Quota tracking per `Category#Operation` and the pre-send / post-receive
//! throttling decisions built on it.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::response::Response;

/// Extra wait added past the reported reset time.
pub const RESET_BUFFER: Duration = Duration::from_millis(500);

/// Most recently reported rate-limit state for one category/operation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub remaining: i64,
    pub resets_at: OffsetDateTime,
}

impl Quota {
    pub const fn new(remaining: i64, resets_at: OffsetDateTime) -> Self {
        Self {
            remaining,
            resets_at,
        }
    }

    pub fn is_exhausted_at(&self, now: OffsetDateTime) -> bool {
        self.remaining <= 0 && now < self.resets_at
    }
}

/// `"{category}#{operation}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrottleKey(String);

impl ThrottleKey {
    pub fn new(category: &str, operation: &str) -> Self {
        Self(format!("{category}#{operation}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ThrottleKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quota table owned by one client instance. Reads and replacements are atomic.
#[derive(Debug, Default)]
pub struct ThrottleTable {
    entries: Mutex<HashMap<ThrottleKey, Quota>>,
}

impl ThrottleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ThrottleKey) -> Option<Quota> {
        self.lock().get(key).copied()
    }

    /// Replaces the stored quota; last writer wins.
    pub fn record(&self, key: &ThrottleKey, quota: Quota) {
        self.lock().insert(key.clone(), quota);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ThrottleKey, Quota>> {
        self.entries
            .lock()
            .expect("throttle table lock should not be poisoned")
    }
}

/// Outcome of inspecting a response for throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleVerdict {
    /// The response stands; return it to the caller.
    Settled,
    /// The provider rejected the request as throttled; back off and resend.
    Throttled,
}

/// Decides when to wait before a send and whether a response calls for a retry.
#[derive(Clone)]
pub struct ThrottleController {
    table: Arc<ThrottleTable>,
    clock: Arc<dyn Clock>,
    buffer: Duration,
}

impl ThrottleController {
    pub fn new(table: Arc<ThrottleTable>, clock: Arc<dyn Clock>) -> Self {
        Self {
            table,
            clock,
            buffer: RESET_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn table(&self) -> &ThrottleTable {
        &self.table
    }

    /// How long a send for `key` must wait right now, if at all.
    pub fn pending_wait(&self, key: &ThrottleKey) -> Option<Duration> {
        let quota = self.table.get(key)?;
        let now = self.clock.now();
        if !quota.is_exhausted_at(now) {
            return None;
        }

        let until_reset = (quota.resets_at - now).unsigned_abs();
        Some(until_reset + self.buffer)
    }

    /// Blocks until the quota for `key` has reset. Returns the time waited.
    pub async fn before_send(&self, key: &ThrottleKey) -> Option<Duration> {
        let wait = self.pending_wait(key)?;
        info!(
            key = key.as_str(),
            wait_ms = wait.as_millis() as u64,
            "quota exhausted; waiting for reset"
        );
        self.clock.sleep(wait).await;
        Some(wait)
    }

    /// Records quota headers, or reports throttling signalled in the body.
    pub fn after_receive(&self, key: &ThrottleKey, response: &Response) -> ThrottleVerdict {
        if let Some(quota) = response.quota() {
            debug!(
                key = key.as_str(),
                remaining = quota.remaining,
                resets_at = %quota.resets_at,
                "quota updated"
            );
            self.table.record(key, quota);
            return ThrottleVerdict::Settled;
        }

        if response.is_throttled() {
            warn!(key = key.as_str(), status = response.status(), "request throttled");
            return ThrottleVerdict::Throttled;
        }

        ThrottleVerdict::Settled
    }
}
