use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vnstockalert::{config, routes, AppState};

async fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();

    let mut settings = config::load();
    settings.data_dir = dir.path().to_path_buf();
    settings.database_url = String::new();
    settings.telegram_bot_token = String::new();
    settings.telegram_chat_id = String::new();
    settings.providers = config::ProviderToggles::none();
    settings.sample_prices = false;

    (AppState::from_settings(settings).await, dir)
}

async fn response_body_string(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

async fn response_json(res: axum::response::Response) -> Value {
    serde_json::from_str(&response_body_string(res).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_lists_endpoints() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state).oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["ok"], json!(true));
    assert!(body["endpoints"].as_array().unwrap().contains(&json!("/api/observers")));
}

#[tokio::test]
async fn health_returns_ok() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_body_string(res).await, "ok");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state).oneshot(get("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(res).await, json!({ "error": "not found" }));
}

#[tokio::test]
async fn post_observers_replaces_mapping_and_records_history() {
    let (state, _dir) = test_state().await;

    let res = routes::app(state.clone())
        .oneshot(post_json("/api/observers", r#"{" vcb ": " 95,000 ", "fpt": 120000, "hpg": null, "": "1"}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["observers"], json!({ "VCB": "95,000", "FPT": "120000" }));

    let res = routes::app(state.clone()).oneshot(get("/api/observers")).await.unwrap();
    assert_eq!(response_json(res).await, json!({ "FPT": "120000", "VCB": "95,000" }));

    let res = routes::app(state.clone()).oneshot(get("/api/symbols")).await.unwrap();
    assert_eq!(response_json(res).await, json!({ "symbols": ["FPT", "VCB"] }));

    // providers are off, so the target stands in for the price
    let res = routes::app(state.clone())
        .oneshot(get("/api/history?symbol=vcb"))
        .await
        .unwrap();
    let body = response_json(res).await;
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["symbol"], json!("VCB"));
    assert_eq!(history[0]["target"], json!(95000.0));
    assert_eq!(history[0]["price"], json!(95000.0));

    // same targets again: no new history rows
    routes::app(state.clone())
        .oneshot(post_json("/api/observers", r#"{"VCB": "95,000", "FPT": "120000"}"#))
        .await
        .unwrap();
    let res = routes::app(state).oneshot(get("/api/history")).await.unwrap();
    assert_eq!(response_json(res).await["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn post_observers_non_object_clears_mapping() {
    let (state, _dir) = test_state().await;
    routes::app(state.clone())
        .oneshot(post_json("/api/observers", r#"{"VCB": "95000"}"#))
        .await
        .unwrap();

    let res = routes::app(state.clone())
        .oneshot(post_json("/api/observers", "[1, 2, 3]"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["observers"], json!({}));

    let res = routes::app(state).oneshot(post_json("/api/observers", "not json")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn price_without_symbol_is_400() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state.clone()).oneshot(get("/api/price")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(res).await["error"].is_string());

    let res = routes::app(state).oneshot(get("/api/price?symbol=%20")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn price_is_404_when_every_provider_fails() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state).oneshot(get("/api/price?symbol=vcb")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = response_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("VCB"));
}

#[tokio::test]
async fn match_price_starts_empty() {
    let (state, _dir) = test_state().await;
    let res = routes::app(state).oneshot(get("/api/match-price?symbol=VCB")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await, json!({ "match_price": [] }));
}

#[tokio::test]
async fn check_without_telegram_is_a_no_op() {
    let (state, _dir) = test_state().await;

    for req in [get("/api/check"), post_json("/api/check", "")] {
        let res = routes::app(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = response_json(res).await;
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["message"], json!("Check completed"));
        assert_eq!(body["alerts_sent"], json!(0));
    }
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let (state, _dir) = test_state().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/observers")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let res = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
