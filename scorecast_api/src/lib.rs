//! HTTP surface over the Scorecast feed engine.
//!
//! Every handler borrows the one [`SimulationService`](scorecast_core::SimulationService)
//! held in [`AppState`]; the match clock ticker shares the same instance.

mod server;

pub use server::{router, serve, ApiError, AppState, ErrorCode, ServerError};
