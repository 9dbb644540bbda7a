//! Narrative collaborator seam.
//!
//! Flavour text comes from an external text service that may be slow, down
//! or silent. Every call goes through [`narrate_or_fallback`], which bounds
//! it in time and turns any failure into a deterministic sentence built from
//! the stats already computed. A narrative failure is never an error for the
//! caller.

use crate::error::NarrativeError;
use crate::roster::Player;
use crate::stats::{PlayerStats, RecentEventSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Everything a text service needs to write an update.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub player: Player,
    pub stats: PlayerStats,
    pub event: Option<RecentEventSummary>,
}

impl NarrativeRequest {
    /// Renders the instruction sent to a text service.
    pub fn prompt(&self) -> String {
        let player = &self.player;
        let stats = &self.stats;

        let event_context = self
            .event
            .as_ref()
            .map(|e| format!("{} {} in Q{}. ", player.name, e.kind.phrase(), stats.quarter))
            .unwrap_or_default();

        let game_context = if stats.in_progress {
            format!(
                "Currently Q{}, {} remaining. ",
                stats.quarter, stats.time_remaining_label
            )
        } else {
            "Game completed. ".to_string()
        };

        format!(
            "{event_context}{game_context}Write a 1-2 sentence fantasy update for {} ({}, {}). \
             Current fantasy points: {:.1}. Make it exciting for fantasy owners.",
            player.name, player.role, player.team, stats.score
        )
    }

    /// The sentence used whenever the text service cannot answer.
    pub fn fallback_text(&self) -> String {
        format!(
            "{} ({}, {}) has {:.1} fantasy points in Q{}. {} and contributing to your lineup.",
            self.player.name,
            self.player.role,
            self.player.team,
            self.stats.score,
            self.stats.quarter,
            self.stats.status
        )
    }
}

/// External producer of narrative text.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

/// Generator used when no text service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

#[async_trait]
impl NarrativeGenerator for OfflineNarrator {
    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
        Err(NarrativeError::NotConfigured)
    }
}

/// Where the narrative text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

/// Narrative text plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Asks `generator` for text, bounded by `timeout`; falls back to
/// [`NarrativeRequest::fallback_text`] on any failure.
pub async fn narrate_or_fallback(
    generator: &dyn NarrativeGenerator,
    request: &NarrativeRequest,
    timeout: Duration,
) -> Narrative {
    let failure = match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => {
            return Narrative {
                text: text.trim().to_string(),
                source: NarrativeSource::Generated,
            };
        }
        Ok(Ok(_)) => NarrativeError::EmptyResponse,
        Ok(Err(err)) => err,
        Err(_) => NarrativeError::Timeout(timeout.as_millis() as u64),
    };

    match failure {
        NarrativeError::NotConfigured => debug!(player = %request.player.id, "Narrative fallback used"),
        _ => warn!(player = %request.player.id, error = %failure, "Narrative fallback used"),
    }

    Narrative {
        text: request.fallback_text(),
        source: NarrativeSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventKind;
    use crate::roster::{PlayerId, Roster};
    use crate::store::EntityStatus;

    fn request(event: Option<RecentEventSummary>, in_progress: bool) -> NarrativeRequest {
        NarrativeRequest {
            player: Roster::standard().get(PlayerId(1)).unwrap().clone(),
            stats: PlayerStats {
                score: 24.3,
                status: EntityStatus::Active,
                quarter: 3,
                time_remaining_label: "15:00".to_string(),
                in_progress,
                last_update_ms: 0,
            },
            event,
        }
    }

    struct FixedNarrator(&'static str);

    #[async_trait]
    impl NarrativeGenerator for FixedNarrator {
        async fn generate(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
            Ok(self.0.to_string())
        }
    }

    struct SlowNarrator;

    #[async_trait]
    impl NarrativeGenerator for SlowNarrator {
        async fn generate(&self, _request: &NarrativeRequest) -> Result<String, NarrativeError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_fallback_text() {
        assert_eq!(
            request(None, true).fallback_text(),
            "Josh Allen (QB, BUF) has 24.3 fantasy points in Q3. Active and contributing to your lineup."
        );
    }

    #[test]
    fn test_prompt_with_event() {
        let event = RecentEventSummary {
            kind: EventKind::Touchdown,
            description: EventKind::Touchdown.label(),
            delta: 6.4,
            base_points: 6.0,
        };
        let prompt = request(Some(event), true).prompt();
        assert!(prompt.starts_with("Josh Allen just scored a touchdown in Q3. Currently Q3, 15:00 remaining."));
        assert!(prompt.contains("(QB, BUF)"));
        assert!(prompt.contains("Current fantasy points: 24.3."));
    }

    #[test]
    fn test_prompt_after_final_whistle() {
        let prompt = request(None, false).prompt();
        assert!(prompt.starts_with("Game completed. Write a 1-2 sentence"));
    }

    #[tokio::test]
    async fn test_generated_text_is_used() {
        let narrative = narrate_or_fallback(
            &FixedNarrator("  Allen is cooking.  "),
            &request(None, true),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(narrative.source, NarrativeSource::Generated);
        assert_eq!(narrative.text, "Allen is cooking.");
    }

    #[tokio::test]
    async fn test_offline_falls_back() {
        let req = request(None, true);
        let narrative = narrate_or_fallback(&OfflineNarrator, &req, Duration::from_secs(1)).await;
        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(narrative.text, req.fallback_text());
    }

    #[tokio::test]
    async fn test_empty_response_falls_back() {
        let narrative =
            narrate_or_fallback(&FixedNarrator("   "), &request(None, true), Duration::from_secs(1))
                .await;
        assert_eq!(narrative.source, NarrativeSource::Fallback);
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let narrative =
            narrate_or_fallback(&SlowNarrator, &request(None, true), Duration::from_millis(20))
                .await;
        assert_eq!(narrative.source, NarrativeSource::Fallback);
    }
}
