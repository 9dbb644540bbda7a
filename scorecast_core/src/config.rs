//! Feed configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! {
//!   "cooldownMs": 10000,
//!   "clock": { "tickIntervalMs": 5000 },
//!   "fallbackScoreRange": [0, 40]
//! }
//! ```

use crate::catalog::EventCatalog;
use crate::clock::ClockRules;
use crate::error::ConfigError;
use crate::roster::{standard_players, Player};
use crate::simulator::{DEFAULT_COOLDOWN_MS, DEFAULT_NOISE_AMPLITUDE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for a feed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    pub roster: Vec<Player>,

    pub catalog: EventCatalog,

    /// Minimum milliseconds between two events for one player
    pub cooldown_ms: u64,

    /// Half-width of the jitter added to event points
    pub noise_amplitude: f64,

    /// Inclusive range the reported score is drawn from while simulation is off
    pub fallback_score_range: (i64, i64),

    pub clock: ClockRules,

    /// Upper bound on one narrative call
    pub narrative_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            roster: standard_players(),
            catalog: EventCatalog::standard(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            noise_amplitude: DEFAULT_NOISE_AMPLITUDE,
            fallback_score_range: (5, 29),
            clock: ClockRules::default(),
            narrative_timeout_ms: 2_000,
        }
    }
}

impl FeedConfig {
    /// Parses a JSON document, filling anything missing from the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks the constraints the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::invalid("roster is empty"));
        }

        let mut seen = HashSet::new();
        for player in &self.roster {
            if !seen.insert(player.id) {
                return Err(ConfigError::invalid(format!(
                    "duplicate player id {}",
                    player.id
                )));
            }
        }

        self.catalog.check().map_err(ConfigError::Invalid)?;

        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(ConfigError::invalid("noiseAmplitude must be >= 0"));
        }

        let (low, high) = self.fallback_score_range;
        if low > high {
            return Err(ConfigError::invalid(format!(
                "fallbackScoreRange [{low}, {high}] is inverted"
            )));
        }

        if self.clock.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("clock.tickIntervalMs must be > 0"));
        }

        for (name, p) in [
            ("quarterAdvanceProbability", self.clock.quarter_advance_probability),
            ("matchEndProbability", self.clock.match_end_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::invalid(format!(
                    "clock.{name} is {p}, outside [0, 1]"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Role;

    #[test]
    fn test_default_config_is_valid() {
        let config = FeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roster.len(), 10);
        assert_eq!(config.cooldown_ms, 30_000);
        assert_eq!(config.fallback_score_range, (5, 29));
        assert_eq!(config.clock.tick_interval_ms, 60_000);
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let config = FeedConfig::from_json_str(
            r#"{
                "cooldownMs": 10000,
                "clock": { "tickIntervalMs": 5000 },
                "fallbackScoreRange": [0, 40]
            }"#,
        )
        .unwrap();

        assert_eq!(config.cooldown_ms, 10_000);
        assert_eq!(config.clock.tick_interval_ms, 5_000);
        assert_eq!(config.clock.quarter_advance_probability, 0.10);
        assert_eq!(config.fallback_score_range, (0, 40));
        assert_eq!(config.roster.len(), 10);
    }

    #[test]
    fn test_catalog_override() {
        let config = FeedConfig::from_json_str(
            r#"{
                "catalog": {
                    "events": [
                        { "kind": "sack", "basePoints": 1.0, "eligibleRoles": ["DEF"] }
                    ],
                    "fireProbabilities": { "DEF": 0.5 }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.catalog.events.len(), 1);
        assert_eq!(config.catalog.fire_probability(Role::DEF), 0.5);
        assert_eq!(config.catalog.fire_probability(Role::QB), 0.15);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut config = FeedConfig::default();
        let mut clone = config.roster[0].clone();
        clone.name = "Impostor".to_string();
        config.roster.push(clone);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_range = FeedConfig {
            fallback_score_range: (30, 5),
            ..FeedConfig::default()
        };
        assert!(bad_range.validate().is_err());

        let bad_noise = FeedConfig {
            noise_amplitude: -1.0,
            ..FeedConfig::default()
        };
        assert!(bad_noise.validate().is_err());

        let mut bad_clock = FeedConfig::default();
        bad_clock.clock.match_end_probability = 1.2;
        assert!(bad_clock.validate().is_err());

        let empty = FeedConfig {
            roster: vec![],
            ..FeedConfig::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FeedConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FeedConfig::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
