//! Stats query: the per-request pipeline behind `GET /api/player/{id}/stats`.
//!
//! ```text
//! phase snapshot ─► [player lock: decide ─► apply] ─► reported score ─► narrative
//! ```
//!
//! The score mutation is committed before the narrative call starts, so a
//! slow or failing text service can neither delay nor undo it.

use crate::catalog::EventKind;
use crate::error::FeedError;
use crate::narrative::{narrate_or_fallback, NarrativeRequest, NarrativeSource};
use crate::roster::{Player, PlayerId};
use crate::service::SimulationService;
use crate::store::{EntityStatus, EventRecord};
use scorecast_env::FeedContext;
use serde::{Deserialize, Serialize};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

/// Stats block of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Simulated score, or a fallback draw while simulation is off
    pub score: f64,
    pub status: EntityStatus,
    pub quarter: u8,
    pub time_remaining_label: String,
    pub in_progress: bool,
    /// Wall clock, milliseconds since the Unix epoch
    pub last_update_ms: u64,
}

/// The event fired by this request, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEventSummary {
    pub kind: EventKind,
    pub description: String,
    /// Points actually applied (base plus jitter)
    pub delta: f64,
    pub base_points: f64,
}

/// Simulation flags as seen by this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationFlags {
    pub enabled: bool,
    pub in_progress: bool,
}

/// Full answer to a stats query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub player: Player,
    pub stats: PlayerStats,
    pub narrative: String,
    pub narrative_source: NarrativeSource,
    pub recent_event: Option<RecentEventSummary>,
    /// Bounded history, most recent first
    pub recent_events: Vec<EventRecord>,
    pub simulation: SimulationFlags,
}

impl<C: FeedContext> SimulationService<C> {
    /// Serves one stats request for `player_id`.
    ///
    /// Fails only with [`FeedError::PlayerNotFound`].
    pub async fn query_stats(&self, player_id: PlayerId) -> Result<StatsReport, FeedError> {
        let player = self
            .roster()
            .get(player_id)
            .ok_or(FeedError::PlayerNotFound(player_id))?
            .clone();

        // One phase snapshot drives the whole request
        let phase = self.clock().snapshot();
        let now_ms = self.context().now_ms();

        let (state, decision) = self.store().mutate(player_id, |state| {
            let decision = self
                .simulator()
                .decide(self.context().as_ref(), state, &phase, now_ms);
            if let Some(decision) = &decision {
                state.apply_event(decision.record(now_ms));
            }
            decision
        })?;

        let recent_event = decision.map(|d| {
            info!(
                player = %player.id,
                kind = %d.definition.kind,
                delta = d.delta,
                score = state.current_score,
                "Event fired"
            );
            RecentEventSummary {
                kind: d.definition.kind,
                description: d.definition.kind.label(),
                delta: d.delta,
                base_points: d.definition.base_points,
            }
        });
        if recent_event.is_none() {
            debug!(player = %player.id, "No event");
        }

        let score = if phase.simulation_enabled {
            state.current_score
        } else {
            let (low, high) = self.fallback_score_range();
            self.context().int_between(low, high) as f64
        };

        let last_update_ms = self
            .context()
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let stats = PlayerStats {
            score,
            status: state.status,
            quarter: phase.quarter,
            time_remaining_label: phase.time_remaining_label.clone(),
            in_progress: phase.in_progress,
            last_update_ms,
        };

        let request = NarrativeRequest {
            player,
            stats,
            event: recent_event,
        };
        let narrative =
            narrate_or_fallback(self.narrator(), &request, self.narrative_timeout()).await;

        let NarrativeRequest {
            player,
            stats,
            event,
        } = request;

        Ok(StatsReport {
            player,
            stats,
            narrative: narrative.text,
            narrative_source: narrative.source,
            recent_event: event,
            recent_events: state.recent_events.into_iter().collect(),
            simulation: SimulationFlags {
                enabled: phase.simulation_enabled,
                in_progress: phase.in_progress,
            },
        })
    }
}
