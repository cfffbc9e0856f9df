use crate::api::handlers::{agents, facilitator, health, x402};
use crate::api::state::AppState;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 构建路由（与 serve 分开，便于测试）
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let x402_routes = Router::new()
        .route("/propose", post(x402::propose))
        .route("/vote", post(x402::vote))
        .route("/submit", post(x402::submit))
        .route("/challenge", post(x402::challenge))
        .route("/donate", post(x402::donate))
        .route("/finalize", post(x402::finalize))
        .route("/invalidate", post(x402::invalidate))
        .route("/reset", post(x402::reset))
        .route("/games", get(x402::list_games))
        .route("/games/:id", get(x402::get_game))
        .route("/proposals", get(x402::list_proposals))
        .route("/db/games", get(x402::list_cached_games))
        .route("/default-fee", get(x402::default_fee));

    let facilitator_routes = Router::new()
        .route("/supported", get(facilitator::supported))
        .route("/verify", post(facilitator::verify));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/agents", get(agents::list_agents))
        .nest("/api/x402", x402_routes)
        .nest("/api/facilitator", facilitator_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
