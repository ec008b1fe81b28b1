//! Wall clock effects

/// Source of the current time
pub trait TimeEffects: Send + Sync {
    /// Unix time in milliseconds
    fn now_millis(&self) -> u64;

    /// Unix time in seconds
    fn now_secs(&self) -> u64 {
        self.now_millis() / 1000
    }
}
