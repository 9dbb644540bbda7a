//! Scorecast Core - simulated live fantasy-football scoring feed
//!
//! Turns read requests into plausible, rate-limited score movement:
//! 1. **Catalog**: which scoring events exist, what they are worth, who can score them
//! 2. **Store**: per-player score, cooldown and recent history behind per-player locks
//! 3. **Clock**: a shared quarter state machine advanced by a background tick
//!
//! Everything that reads time or draws randomness goes through
//! [`scorecast_env::FeedContext`], so a run is reproducible from its seed.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod narrative;
pub mod roster;
pub mod service;
pub mod simulator;
pub mod stats;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use catalog::{EventCatalog, EventDefinition, EventKind};
pub use clock::{ClockRules, MatchClock, MatchPhase, TickOutcome};
pub use config::FeedConfig;
pub use error::{ConfigError, FeedError, NarrativeError};
pub use narrative::{
    narrate_or_fallback, Narrative, NarrativeGenerator, NarrativeRequest, NarrativeSource,
    OfflineNarrator,
};
pub use roster::{Player, PlayerId, Role, Roster};
pub use service::SimulationService;
pub use simulator::{EventDecision, EventSimulator};
pub use stats::{PlayerStats, RecentEventSummary, SimulationFlags, StatsReport};
pub use store::{EntityState, EntityStatus, EntityStore, EventRecord};
