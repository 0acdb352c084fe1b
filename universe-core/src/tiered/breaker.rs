//! Circuit breaker guarding the Sovereign tier (spec §4.G, P11).
//!
//! Grounded on the teacher's `circuit_breaker.rs` in shape (failure
//! threshold, cooldown window, half-open recovery) but not in
//! implementation: the teacher mutates shared state through a raw
//! `Arc::as_ptr` write, which is unsound under any concurrent access. Here a
//! single `Mutex` over the breaker's whole state closes that hole while
//! keeping the same external behavior.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open(Instant),
}

struct Inner {
    consecutive_failures: u32,
    state: State,
}

pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner { consecutive_failures: 0, state: State::Closed }),
            failure_threshold,
            reset_timeout,
        }
    }

    /// Whether a call may be attempted right now. A stale `Open` state whose
    /// cooldown has elapsed transitions back to `Closed` (half-open
    /// recovery) as a side effect of the check.
    pub fn try_acquire(&self) -> bool {
        let mut guard = self.inner.lock().unwrap();
        match guard.state {
            State::Closed => true,
            State::Open(opened_at) => {
                if opened_at.elapsed() >= self.reset_timeout {
                    guard.state = State::Closed;
                    guard.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.inner.lock().unwrap().state, State::Open(_))
    }

    /// On success the failure counter decays to zero (spec: "On success the
    /// failure counter decays").
    pub fn record_success(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.consecutive_failures = 0;
        guard.state = State::Closed;
    }

    pub fn record_failure(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.consecutive_failures = guard.consecutive_failures.saturating_add(1);
        if guard.consecutive_failures >= self.failure_threshold {
            guard.state = State::Open(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_allows_calls() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        assert!(cb.try_acquire());
        assert!(!cb.is_open());
    }

    #[test]
    fn three_consecutive_failures_open_the_breaker() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
        assert!(!cb.try_acquire());
    }

    #[test]
    fn success_decays_the_failure_counter() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open(), "counter should have reset on success");
    }

    #[test]
    fn open_breaker_recovers_after_cooldown_elapses() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        assert!(cb.is_open());
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.try_acquire(), "cooldown elapsed; breaker should half-open");
        assert!(!cb.is_open());
    }
}
