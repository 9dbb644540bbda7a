//! Production implementation of FeedContext using Tokio.

use crate::FeedContext;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the system clock, randomness from a `StdRng` seeded
/// either from the OS or from an operator-supplied seed.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Shared generator for every draw the engine makes
    rng: Mutex<StdRng>,

    /// Seed the generator was built from (0 = OS entropy)
    seed: u64,
}

impl TokioContext {
    /// Creates a new TokioContext seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            rng: Mutex::new(StdRng::from_entropy()),
            seed: 0,
        }
    }

    /// Creates a context whose draws are reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            start: Instant::now(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, _name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }

    fn uniform(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen::<f64>()
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
