//! Scorecast Deterministic Simulation Testing (DST) Harness
//!
//! Runs the feed engine against a virtual clock and a seeded RNG so every
//! run is reproducible from one 64-bit seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock advances only when a scenario (or `sleep`) moves it
//! - **Randomness**: All draws come from a single seeded ChaCha8 stream, or
//!   from a script of exact values pushed by a test
//!
//! # Usage
//!
//! ```ignore
//! use scorecast_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::CooldownStorm).await;
//! assert!(result.passed);
//! ```

mod context;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
