use std::future::Future;
use std::net::SocketAddr;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use scorecast_env::FeedContext;
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod routes;
mod state;
mod util;

pub use error::{ApiError, ErrorCode, ServerError};
pub use state::AppState;

use routes::{game_status, health, list_players, player_stats, restart_game, toggle_simulation};
use util::apply_cors_headers;

/// Serves the feed on `addr` until `shutdown` resolves.
pub async fn serve<C: FeedContext>(
    addr: SocketAddr,
    state: AppState<C>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

pub fn router<C: FeedContext>(state: AppState<C>) -> Router {
    Router::new()
        .route("/", get(health::<C>))
        .route("/api/players", get(list_players::<C>))
        .route("/api/game-status", get(game_status::<C>))
        .route("/api/simulation/toggle", post(toggle_simulation::<C>))
        .route("/api/simulation/restart-game", post(restart_game::<C>))
        .route("/api/player/{id}/stats", get(player_stats::<C>))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
