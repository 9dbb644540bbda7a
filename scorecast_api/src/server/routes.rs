use axum::extract::{Path, State};
use axum::Json;
use scorecast_core::{MatchPhase, Player, StatsReport};
use scorecast_env::FeedContext;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::HttpApiError;
use super::state::AppState;
use super::util::parse_player_id;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthResponse {
    pub(crate) message: String,
    pub(crate) simulation: String,
    pub(crate) game_status: String,
    pub(crate) players: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GameStatusResponse {
    pub(crate) simulation_enabled: bool,
    pub(crate) in_progress: bool,
    pub(crate) quarter: u8,
    pub(crate) time_remaining_label: String,
    pub(crate) message: String,
}

impl From<MatchPhase> for GameStatusResponse {
    fn from(phase: MatchPhase) -> Self {
        let message = phase.status_message();
        Self {
            simulation_enabled: phase.simulation_enabled,
            in_progress: phase.in_progress,
            quarter: phase.quarter,
            time_remaining_label: phase.time_remaining_label,
            message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToggleResponse {
    pub(crate) simulation_enabled: bool,
    pub(crate) message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RestartResponse {
    pub(crate) message: String,
    pub(crate) quarter: u8,
    pub(crate) time_remaining_label: String,
    pub(crate) in_progress: bool,
}

pub(crate) async fn health<C: FeedContext>(State(state): State<AppState<C>>) -> Json<HealthResponse> {
    let service = state.service();
    let phase = service.game_status();

    Json(HealthResponse {
        message: "Scorecast feed is running".to_string(),
        simulation: if phase.simulation_enabled { "enabled" } else { "disabled" }.to_string(),
        game_status: if phase.in_progress {
            format!("Q{} {}", phase.quarter, phase.time_remaining_label)
        } else {
            "Game over".to_string()
        },
        players: service.roster().len(),
    })
}

pub(crate) async fn list_players<C: FeedContext>(
    State(state): State<AppState<C>>,
) -> Json<Vec<Player>> {
    Json(state.service().players().to_vec())
}

pub(crate) async fn game_status<C: FeedContext>(
    State(state): State<AppState<C>>,
) -> Json<GameStatusResponse> {
    Json(state.service().game_status().into())
}

pub(crate) async fn toggle_simulation<C: FeedContext>(
    State(state): State<AppState<C>>,
) -> Json<ToggleResponse> {
    let enabled = state.service().toggle_simulation();
    let message = if enabled {
        "Simulation enabled"
    } else {
        "Simulation disabled - ready for live data"
    };

    Json(ToggleResponse {
        simulation_enabled: enabled,
        message: message.to_string(),
    })
}

pub(crate) async fn restart_game<C: FeedContext>(
    State(state): State<AppState<C>>,
) -> Json<RestartResponse> {
    let phase = state.service().restart_game();
    info!(players = state.service().roster().len(), "New game started");

    Json(RestartResponse {
        message: "New game started".to_string(),
        quarter: phase.quarter,
        time_remaining_label: phase.time_remaining_label,
        in_progress: phase.in_progress,
    })
}

pub(crate) async fn player_stats<C: FeedContext>(
    State(state): State<AppState<C>>,
    Path(raw_id): Path<String>,
) -> Result<Json<StatsReport>, HttpApiError> {
    let player_id = parse_player_id(&raw_id)?;

    let report = state
        .service()
        .query_stats(player_id)
        .await
        .map_err(HttpApiError::from_feed)?;

    Ok(Json(report))
}
