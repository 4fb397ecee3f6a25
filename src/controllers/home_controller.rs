use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub const APP_NAME: &str = "vietnam-stock-telegram";

pub const API_ENDPOINTS: [&str; 6] = [
    "/api/symbols",
    "/api/observers",
    "/api/history",
    "/api/match-price",
    "/api/price",
    "/api/check",
];

// GET /
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "app": APP_NAME,
        "endpoints": API_ENDPOINTS,
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
