//! Core environment context trait for the Scorecast feed.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the feed engine can run
/// against production time and entropy (tokio) or against a virtual clock
/// and seeded RNG in the simulation harness.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `StdRng` from entropy
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`, scripted draws
///
/// # Determinism
///
/// Every random decision in the engine goes through [`FeedContext::uniform`].
/// The derived draws below are provided methods built on it, so a context
/// that scripts `uniform` also scripts every pick, range and coin flip.
#[async_trait]
pub trait FeedContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Cooldowns and event timestamps are measured on this clock.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time, used for `lastUpdate` style fields.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Draws a uniform sample in `[0, 1)`.
    fn uniform(&self) -> f64;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 unless the context was explicitly seeded.
    fn seed(&self) -> u64;

    /// Monotonic time in whole milliseconds.
    fn now_ms(&self) -> u64 {
        self.now().as_millis() as u64
    }

    /// Draws a uniform sample in `[low, high)`.
    fn uniform_between(&self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.uniform()
    }

    /// Picks an index in `0..len`, or `None` when there is nothing to pick.
    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = (self.uniform() * len as f64) as usize;
        Some(index.min(len - 1))
    }

    /// Draws an integer in `[low, high]` (inclusive on both ends).
    ///
    /// An inverted range collapses to `low`. The span is computed in `i128`,
    /// so the full `i64` range is accepted.
    fn int_between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = i128::from(high) - i128::from(low);
        let offset = (self.uniform() * (span + 1) as f64) as i128;
        (i128::from(low) + offset.clamp(0, span)) as i64
    }
}
