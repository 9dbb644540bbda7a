//! Error types for the Scorecast engine.
//!
//! Only [`FeedError::PlayerNotFound`] ever reaches a caller of the engine.
//! Narrative failures are recovered where they happen, and the simulator and
//! clock have no failure modes at all: every branch ends in "no event" or
//! "no phase change".

use crate::roster::PlayerId;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The requested player is not on the roster
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),
}

/// Failures of the external narrative collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    /// No text service is attached to this feed
    #[error("No narrative service configured")]
    NotConfigured,

    /// The text service could not be reached or refused the request
    #[error("Narrative service unavailable: {0}")]
    Unavailable(String),

    /// The text service did not answer within the configured bound
    #[error("Narrative service timed out after {0}ms")]
    Timeout(u64),

    /// The text service answered with nothing usable
    #[error("Narrative service returned an empty response")]
    EmptyResponse,
}

impl NarrativeError {
    /// Creates an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Errors raised while loading or validating a [`FeedConfig`](crate::FeedConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for the expected schema
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed but violates an engine constraint
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
