//! Scorecast Environment Abstraction Layer
//!
//! This crate provides the abstraction that lets the Scorecast feed engine run
//! against **Production** (tokio) time and entropy or inside the
//! deterministic **Simulation** harness.
//!
//! # Core Concept
//!
//! The engine never reads an ambient clock or an ambient random generator.
//! Everything non-deterministic is requested from a [`FeedContext`]:
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Scheduling (`spawn()`)
//! - Randomness (`uniform()` and the draws derived from it)
//!
//! By routing every draw through one seeded source, any surprising match
//! becomes reproducible from its seed number.
//!
//! # Example
//!
//! ```ignore
//! use scorecast_env::FeedContext;
//!
//! async fn clock_loop<Ctx: FeedContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_secs(60)).await;
//!         if ctx.uniform() < 0.10 {
//!             advance_quarter();
//!         }
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::FeedContext;
pub use tokio_impl::TokioContext;
