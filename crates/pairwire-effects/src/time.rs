//! Time handlers

use pairwire_core::effects::TimeEffects;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeHandler;

impl SystemTimeHandler {
    /// Create a system time handler
    pub fn new() -> Self {
        Self
    }
}

impl TimeEffects for SystemTimeHandler {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

/// Manually driven clock for tests
#[derive(Debug, Clone, Default)]
pub struct FixedTimeHandler {
    now_millis: Arc<AtomicU64>,
}

impl FixedTimeHandler {
    /// Clock frozen at `now_millis`
    pub fn new(now_millis: u64) -> Self {
        Self {
            now_millis: Arc::new(AtomicU64::new(now_millis)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now_millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeEffects for FixedTimeHandler {
    fn now_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedTimeHandler::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 3_000);
        assert_eq!(clock.now_secs(), 3);
    }
}
