use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, round, season, shared::AppState, standings};

/// Assembles the HTTP API; submission and deletion sit behind the admin gate
pub fn build_router(state: AppState) -> Router {
    let admin = middleware::from_fn_with_state(state.clone(), auth::admin_auth);

    Router::new()
        .route("/api/season", get(season::current_season))
        .route("/api/seasons", get(season::list_seasons))
        .route("/api/seasons/:season", get(season::get_season))
        .route(
            "/api/seasons/:season/rounds",
            get(round::list_season_rounds),
        )
        .route(
            "/api/seasons/:season/rounds/:round",
            get(round::get_season_round),
        )
        .route(
            "/api/seasons/:season/standings",
            get(standings::season_standings),
        )
        .route(
            "/api/rounds",
            axum::routing::post(round::submit_round)
                .delete(round::delete_last_round)
                .route_layer(admin)
                .get(round::list_current_rounds),
        )
        .route("/api/rounds/:round", get(round::get_current_round))
        .route("/api/standings", get(standings::current_standings))
        .route("/api/participants", get(standings::list_participants))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
