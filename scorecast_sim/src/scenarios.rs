//! Deterministic feed scenarios for DST.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// DST-001: Every player polled every virtual second for a full match
    CooldownStorm,

    /// DST-002: Clock ticked every virtual minute until the final whistle
    FullMatch,

    /// DST-003: Simulation disabled for the whole run
    PausedFeed,

    /// DST-004: Many independent final-quarter ticks
    EndgameOdds,

    /// DST-005: Play, restart, verify the reset
    RestartMidGame,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::CooldownStorm,
            ScenarioId::FullMatch,
            ScenarioId::PausedFeed,
            ScenarioId::EndgameOdds,
            ScenarioId::RestartMidGame,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::CooldownStorm => "cooldown_storm",
            ScenarioId::FullMatch => "full_match",
            ScenarioId::PausedFeed => "paused_feed",
            ScenarioId::EndgameOdds => "endgame_odds",
            ScenarioId::RestartMidGame => "restart_mid_game",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::CooldownStorm => {
                "Poll every player each second: cooldown, history cap and delta bounds hold"
            }
            ScenarioId::FullMatch => "Tick until the match ends: quarters only move forward, end from Q4",
            ScenarioId::PausedFeed => "Simulation off: no events, no phase change, fallback scores only",
            ScenarioId::EndgameOdds => "Q4 end rate converges on advance x end probability",
            ScenarioId::RestartMidGame => "Restart after play: Q1 15:00 and every player back at base",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cooldown_storm" | "cooldownstorm" | "dst-001" => Ok(ScenarioId::CooldownStorm),
            "full_match" | "fullmatch" | "dst-002" => Ok(ScenarioId::FullMatch),
            "paused_feed" | "pausedfeed" | "dst-003" => Ok(ScenarioId::PausedFeed),
            "endgame_odds" | "endgameodds" | "dst-004" => Ok(ScenarioId::EndgameOdds),
            "restart_mid_game" | "restartmidgame" | "dst-005" => Ok(ScenarioId::RestartMidGame),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
