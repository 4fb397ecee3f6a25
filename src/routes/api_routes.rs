use axum::{Router, routing::get};
use crate::{AppState, controllers::api_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/symbols", get(api_controller::get_symbols))
        .route(
            "/api/observers",
            get(api_controller::get_observers).post(api_controller::post_observers),
        )
        .route("/api/history", get(api_controller::get_history))
        .route("/api/match-price", get(api_controller::get_match_price))
        .route("/api/price", get(api_controller::get_price))
        .route("/api/check", get(api_controller::run_check).post(api_controller::run_check))
}
