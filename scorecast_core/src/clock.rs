//! Match clock: the shared quarter / time / in-progress state machine.
//!
//! ```text
//!   Q1 ──► Q2 ──► Q3 ──► Q4 ──► Ended
//!    ▲                            │
//!    └────────── restart ─────────┘
//! ```
//!
//! Each tick, when the match is live and simulation is on, the quarter
//! advances with `quarter_advance_probability`. In Q4 an advancing tick
//! instead ends the match with `match_end_probability`. Ended is terminal
//! until an explicit restart.

use scorecast_env::FeedContext;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Last quarter of a match.
pub const FINAL_QUARTER: u8 = 4;

/// Label shown at the start of every quarter.
pub const QUARTER_START_LABEL: &str = "15:00";

/// Label shown once the match has ended naturally.
pub const FINAL_WHISTLE_LABEL: &str = "0:00";

/// Shared match phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPhase {
    /// 1..=4
    pub quarter: u8,
    pub time_remaining_label: String,
    pub in_progress: bool,
    /// Independently toggled; gates both ticks and events
    pub simulation_enabled: bool,
}

impl MatchPhase {
    /// A live match at the start of Q1 with simulation on.
    pub fn kickoff() -> Self {
        Self {
            quarter: 1,
            time_remaining_label: QUARTER_START_LABEL.to_string(),
            in_progress: true,
            simulation_enabled: true,
        }
    }

    /// True when ticks and events are allowed to change anything.
    pub fn is_live(&self) -> bool {
        self.in_progress && self.simulation_enabled
    }

    /// Short human summary of the phase.
    pub fn status_message(&self) -> String {
        if !self.simulation_enabled {
            "Live data mode - simulation disabled".to_string()
        } else if self.in_progress {
            format!("Live simulation: Q{} {}", self.quarter, self.time_remaining_label)
        } else {
            "Game completed".to_string()
        }
    }
}

impl Default for MatchPhase {
    fn default() -> Self {
        Self::kickoff()
    }
}

/// Tunables for the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClockRules {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    pub quarter_advance_probability: f64,
    /// Applied only to an advancing tick in the final quarter
    pub match_end_probability: f64,
}

impl Default for ClockRules {
    fn default() -> Self {
        Self {
            tick_interval_ms: 60_000,
            quarter_advance_probability: 0.10,
            match_end_probability: 0.30,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Match over or simulation paused; nothing was drawn
    Idle,
    /// Live, but the draw left the phase alone
    Unchanged,
    /// Moved into the given quarter
    QuarterAdvanced(u8),
    /// Final whistle
    MatchEnded,
}

/// Exclusive owner of the [`MatchPhase`].
#[derive(Debug)]
pub struct MatchClock {
    phase: Mutex<MatchPhase>,
    rules: ClockRules,
}

impl MatchClock {
    /// A clock at kickoff.
    pub fn new(rules: ClockRules) -> Self {
        Self::with_phase(rules, MatchPhase::kickoff())
    }

    /// A clock starting from an arbitrary phase; the quarter is clamped to 1..=4.
    pub fn with_phase(rules: ClockRules, mut phase: MatchPhase) -> Self {
        phase.quarter = phase.quarter.clamp(1, FINAL_QUARTER);
        Self {
            phase: Mutex::new(phase),
            rules,
        }
    }

    pub fn rules(&self) -> &ClockRules {
        &self.rules
    }

    /// Returns a consistent copy of the phase.
    pub fn snapshot(&self) -> MatchPhase {
        self.lock().clone()
    }

    /// Advances the state machine by one tick.
    pub fn tick<C: FeedContext>(&self, ctx: &C) -> TickOutcome {
        let mut phase = self.lock();

        if !phase.is_live() {
            return TickOutcome::Idle;
        }

        if ctx.uniform() >= self.rules.quarter_advance_probability {
            return TickOutcome::Unchanged;
        }

        if phase.quarter < FINAL_QUARTER {
            phase.quarter += 1;
            phase.time_remaining_label = QUARTER_START_LABEL.to_string();
            info!(quarter = phase.quarter, "Quarter advanced");
            return TickOutcome::QuarterAdvanced(phase.quarter);
        }

        if ctx.uniform() < self.rules.match_end_probability {
            phase.in_progress = false;
            phase.time_remaining_label = FINAL_WHISTLE_LABEL.to_string();
            info!("Match ended");
            return TickOutcome::MatchEnded;
        }

        debug!("Final quarter continues");
        TickOutcome::Unchanged
    }

    /// Flips `simulation_enabled` and returns the new value.
    pub fn toggle_simulation(&self) -> bool {
        let mut phase = self.lock();
        phase.simulation_enabled = !phase.simulation_enabled;
        info!(enabled = phase.simulation_enabled, "Simulation toggled");
        phase.simulation_enabled
    }

    /// Puts the match back to Q1 / "15:00" / in progress.
    ///
    /// `on_restart` runs while the phase lock is held, so no tick, toggle or
    /// snapshot can interleave with whatever it resets. `simulation_enabled`
    /// is left as it was.
    pub fn restart(&self, on_restart: impl FnOnce()) -> MatchPhase {
        let mut phase = self.lock();
        phase.quarter = 1;
        phase.time_remaining_label = QUARTER_START_LABEL.to_string();
        phase.in_progress = true;
        on_restart();
        info!("Match restarted");
        phase.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MatchPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new(ClockRules::default())
    }
}
