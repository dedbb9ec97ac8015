//! API integration tests for share-api routes.
//!
//! Uses Axum's `tower::ServiceExt` to send requests directly to the app
//! without binding a TCP socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use share_api::app::build_app;
use share_api::state::AppState;
use share_core::{diagnostic_channel, PlaybackId};

fn app() -> axum::Router {
    build_app(AppState::new())
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(b) = body {
        builder.body(Body::from(serde_json::to_vec(&b).unwrap())).unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

async fn create_page(app: &axum::Router, playback_id: &str) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/pages",
            Some(json!({ "playback_id": playback_id, "time": "3" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp.into_body()).await
}

async fn send_event(app: &axum::Router, id: &str, event: Value) -> Value {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/pages/{}/events", id),
            Some(event),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp.into_body()).await
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn metrics_returns_openmetrics() {
    let resp = app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.contains("openmetrics-text"));
    let text = body_text(resp.into_body()).await;
    assert!(text.contains("share_player_cached_pages 0"));
    assert!(text.contains("share_player_playback_errors_total 0"));
    assert!(text.trim_end().ends_with("# EOF"));
}

#[tokio::test]
async fn static_paths_declare_on_demand_generation() {
    let resp = app().oneshot(get("/api/v1/static-paths")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.into_body()).await;
    assert_eq!(body, json!({ "paths": [], "fallback": true }));
}

#[tokio::test]
async fn page_is_generated_once_then_served_from_cache() {
    let state = AppState::new();
    let app = build_app(state.clone());

    let first = app.clone().oneshot(get("/v/abc")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-page-cache"], "MISS");
    let etag = first.headers()["etag"].clone();
    let html = body_text(first.into_body()).await;
    assert!(html.contains("https://image.mux.com/abc/thumbnail.png"));
    assert!(html.contains("<title>Remotion Showcase Upload</title>"));
    assert!(html.contains("Loading player"));

    let second = app.oneshot(get("/v/abc")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-page-cache"], "HIT");
    assert_eq!(second.headers()["etag"], etag);
    assert_eq!(state.pages.len(), 1);
}

#[tokio::test]
async fn matching_etag_returns_not_modified() {
    let app = app();
    let first = app.clone().oneshot(get("/v/abc")).await.unwrap();
    let etag = first.headers()["etag"].to_str().unwrap().to_string();

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/v/abc")
                .header("if-none-match", &etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(resp.headers()["etag"], etag.as_str());
}

#[tokio::test]
async fn start_time_changes_variant_etag() {
    let app = app();
    let plain = app.clone().oneshot(get("/v/abc")).await.unwrap();
    let timed = app.oneshot(get("/v/abc?time=12.5")).await.unwrap();
    assert_ne!(plain.headers()["etag"], timed.headers()["etag"]);

    let html = body_text(timed.into_body()).await;
    assert!(html.contains("data-current-time=\"12.5\""));
}

#[tokio::test]
async fn garbage_time_starts_at_zero() {
    let resp = app().oneshot(get("/v/abc?time=abc")).await.unwrap();
    let html = body_text(resp.into_body()).await;
    assert!(html.contains("data-current-time=\"0\""));
}

#[tokio::test]
async fn repeated_time_uses_first_value() {
    let resp = app().oneshot(get("/v/abc?time=5&time=7")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp.into_body()).await;
    assert!(html.contains("data-current-time=\"5\""));
}

#[tokio::test]
async fn unrelated_query_keys_are_ignored() {
    let resp = app()
        .oneshot(get("/v/abc?utm_source=x&utm_source=y&time=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp.into_body()).await;
    assert!(html.contains("data-current-time=\"2\""));
}

#[tokio::test]
async fn pending_generation_serves_fallback() {
    let state = AppState::new();
    let id = PlaybackId::parse("slow").unwrap();
    assert!(state.pages.mark_pending(&id));
    let app = build_app(state);

    let resp = app.oneshot(get("/v/slow")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-store");
    assert!(resp.headers().get("etag").is_none());
    let html = body_text(resp.into_body()).await;
    assert!(html.contains("<title>View this video</title>"));
    assert!(html.contains("Loading player..."));
    assert!(!html.contains("data-player"));
}

#[tokio::test]
async fn blank_playback_id_is_not_found() {
    let resp = app().oneshot(get("/v/%20")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp.into_body()).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn create_page_returns_loading_view() {
    let body = create_page(&app(), "abc").await;
    assert!(body["id"].is_string());
    assert_eq!(body["playback_id"], "abc");
    assert_eq!(body["view"]["state"], json!({ "status": "loading" }));
    assert_eq!(body["view"]["content_visible"], false);
    assert_eq!(body["view"]["player"]["start_time"], 3.0);
    assert_eq!(body["view"]["report_toggle"], "Report abuse");
}

#[tokio::test]
async fn create_page_rejects_blank_id() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/pages",
            Some(json!({ "playback_id": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ready_event_reveals_content() {
    let app = app();
    let created = create_page(&app, "abc").await;
    let id = created["id"].as_str().unwrap();

    let body = send_event(&app, id, json!({ "type": "size", "width": 1920, "height": 1080 })).await;
    assert_eq!(body["view"]["size"], json!({ "width": 1920, "height": 1080 }));

    let body = send_event(&app, id, json!({ "type": "ready" })).await;
    assert_eq!(body["view"]["state"], json!({ "status": "loaded" }));
    assert_eq!(body["view"]["content_visible"], true);
    assert!(body["view"]["loading_text"].is_null());
    assert!(body["view"]["snippet"]
        .as_str()
        .unwrap()
        .contains("height: 1080,"));
}

#[tokio::test]
async fn error_event_shows_banner_and_reports_diagnostic() {
    let (sink, mut rx) = diagnostic_channel();
    let state = AppState::new().with_diagnostics(Arc::new(sink));
    let app = build_app(state.clone());

    let created = create_page(&app, "gone").await;
    let id = created["id"].as_str().unwrap();

    let body = send_event(
        &app,
        id,
        json!({ "type": "error", "detail": { "code": 404 } }),
    )
    .await;
    assert_eq!(
        body["view"]["state"],
        json!({ "status": "error", "message": "This video does not exist" })
    );
    assert_eq!(body["view"]["error_banner"], "This video does not exist");
    assert!(body["view"]["player"].is_null());

    let diagnostic = rx.try_recv().unwrap();
    assert_eq!(diagnostic.playback_id.as_str(), "gone");
    assert_eq!(diagnostic.detail, json!({ "code": 404 }));

    let resp = app.oneshot(get("/metrics")).await.unwrap();
    let text = body_text(resp.into_body()).await;
    assert!(text.contains("share_player_playback_errors_total 1"));
}

#[tokio::test]
async fn report_flow_swaps_player_and_form() {
    let app = app();
    let created = create_page(&app, "abc").await;
    let id = created["id"].as_str().unwrap();
    send_event(&app, id, json!({ "type": "ready" })).await;

    let body = send_event(&app, id, json!({ "type": "toggle_report" })).await;
    assert!(body["view"]["player"].is_null());
    assert!(body["view"]["report_toggle"].is_null());
    assert_eq!(body["view"]["report_form"]["playback_id"], "abc");
    assert_eq!(body["view"]["report_form"]["close"], json!({ "type": "close_report" }));

    let body = send_event(&app, id, json!({ "type": "close_report" })).await;
    assert!(body["view"]["report_form"].is_null());
    assert_eq!(body["view"]["state"], json!({ "status": "loading" }));
    assert_eq!(body["view"]["player"]["playback_id"], "abc");
    assert_eq!(body["view"]["report_toggle"], "Report abuse");
}

#[tokio::test]
async fn copy_share_link_sets_copied() {
    let app = app();
    let created = create_page(&app, "abc").await;
    let id = created["id"].as_str().unwrap();

    let body = send_event(&app, id, json!({ "type": "copy_share_link" })).await;
    assert_eq!(body["view"]["copied"], true);
    assert_eq!(body["view"]["share_url"], "http://localhost:8080/v/abc");
}

#[tokio::test]
async fn fallback_instance_resolves_once_generated() {
    let state = AppState::new();
    let id = PlaybackId::parse("slow").unwrap();
    state.pages.mark_pending(&id);
    let app = build_app(state.clone());

    let created = create_page(&app, "slow").await;
    assert_eq!(
        created["view"]["state"],
        json!({ "status": "fallback_loading" })
    );
    assert_eq!(created["view"]["loading_text"], "Loading player...");
    let page_id = created["id"].as_str().unwrap().to_string();

    let body = send_event(&app, &page_id, json!({ "type": "toggle_report" })).await;
    assert!(body["view"]["report_form"].is_null());

    // A generator elsewhere finishes; the cache now holds the page.
    state.pages.complete(state.generate(&id));

    let resp = app
        .oneshot(get(&format!("/api/v1/pages/{}", page_id)))
        .await
        .unwrap();
    let body = body_json(resp.into_body()).await;
    assert_eq!(body["view"]["state"], json!({ "status": "loading" }));
    assert_eq!(body["view"]["player"]["start_time"], 3.0);
}

#[tokio::test]
async fn list_pages_reports_state() {
    let app = app();
    let created = create_page(&app, "abc").await;
    let id = created["id"].as_str().unwrap();
    send_event(&app, id, json!({ "type": "ready" })).await;

    let resp = app.oneshot(get("/api/v1/pages")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.into_body()).await;
    let pages = body.as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["state"], "loaded");
    assert_eq!(pages[0]["report_open"], false);
}

#[tokio::test]
async fn delete_page_tears_down() {
    let state = AppState::new();
    let app = build_app(state.clone());
    let created = create_page(&app, "abc").await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &format!("/api/v1/pages/{}", id), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.into_body()).await;
    assert_eq!(body["id"], id.as_str());
    assert!(state.instances.is_empty());

    let resp = app
        .oneshot(get(&format!("/api/v1/pages/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_page_returns_404() {
    let resp = app()
        .oneshot(get(&format!("/api/v1/pages/{}", uuid_nil())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_page_id_returns_400() {
    let resp = app()
        .oneshot(get("/api/v1/pages/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp.into_body()).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn metrics_escape_playback_id_labels() {
    let app = app();
    create_page(&app, "x\"} 1\nfake_metric 999\n#").await;

    let resp = app.oneshot(get("/metrics")).await.unwrap();
    let text = body_text(resp.into_body()).await;

    for line in text.lines() {
        assert!(
            line.starts_with("# ") || line.starts_with("share_player_"),
            "unexpected metrics line: {:?}",
            line
        );
    }
    assert!(!text.lines().any(|l| l.starts_with("fake_metric")));
    assert!(text.contains(r##"playback_id="x\"} 1\nfake_metric 999\n#""##));
    assert_eq!(text.matches("state=\"loading\"} 1").count(), 1);
}

#[tokio::test]
async fn shutdown_tears_down_live_pages() {
    let state = AppState::new();
    let created = create_page(&build_app(state.clone()), "abc").await;
    let id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();
    let instance = Arc::clone(state.instances.get(&id).unwrap().value());

    share_api::serve_with_state("127.0.0.1:0".parse().unwrap(), state.clone(), async {})
        .await
        .unwrap();

    assert!(state.instances.is_empty());
    assert!(instance.page.lock().await.is_torn_down());
}

fn uuid_nil() -> &'static str {
    "00000000-0000-0000-0000-000000000000"
}
