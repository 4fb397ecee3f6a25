use axum::{
    http::{header, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{AppState, controllers::home_controller};

pub mod home_routes;
pub mod api_routes;

pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = api_routes::add_routes(router);

    router
        .fallback(home_controller::not_found)
        .layer(cors())
        .with_state(state)
}
