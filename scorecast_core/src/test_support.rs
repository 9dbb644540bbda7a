//! Deterministic context for unit tests inside this crate.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scorecast_env::FeedContext;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Virtual clock plus seeded draws, with an optional script of exact draws
/// consumed before the generator.
pub struct ScriptedContext {
    seed: u64,
    time_ms: AtomicU64,
    rng: Mutex<StdRng>,
    script: Mutex<VecDeque<f64>>,
    taken: AtomicU64,
    fail_next: AtomicBool,
}

impl ScriptedContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            time_ms: AtomicU64::new(0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            script: Mutex::new(VecDeque::new()),
            taken: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn push_draws(&self, draws: &[f64]) {
        self.script.lock().unwrap().extend(draws.iter().copied());
    }

    pub fn advance_ms(&self, ms: u64) {
        self.time_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Makes the next draw panic, once.
    pub fn fail_next_draw(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn draws_taken(&self) -> u64 {
        self.taken.load(Ordering::SeqCst)
    }

    pub fn pending_draws(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedContext for ScriptedContext {
    fn now(&self) -> Duration {
        Duration::from_millis(self.time_ms.load(Ordering::SeqCst))
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000) + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance_ms(duration.as_millis() as u64);
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, _name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future);
    }

    fn uniform(&self) -> f64 {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            panic!("scripted draw failure");
        }
        self.taken.fetch_add(1, Ordering::SeqCst);
        if let Some(draw) = self.script.lock().unwrap().pop_front() {
            return draw;
        }
        self.rng.lock().unwrap().gen::<f64>()
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
