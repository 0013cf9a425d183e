//! HTTP API tests driven through the router without binding a socket

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_for, fixture, ReadOnlyStore};
use rasp::config::Config;
use rasp::directory::Directory;
use rasp::pipeline::ScheduleService;
use rasp::server::{create_router, AppState, TimetableServer};
use rasp::storage::{write_json, MemoryStore, ScheduleKey, ScheduleStore};

fn router(config: &Config, store: Arc<dyn ScheduleStore>) -> Router {
    TimetableServer::new(config, store).unwrap().build_router()
}

async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn store_directories(store: &dyn ScheduleStore) {
    let groups: Directory = [
        ("531030143", "6101-090301D"),
        ("531030144", "6102-090301D"),
        ("531030200", "1101-240301D"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let staff: Directory = [("333991624-vasin", "Васин Александр Владимирович")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    write_json(store, &ScheduleKey::named(ScheduleKey::GROUPS), &groups)
        .await
        .unwrap();
    write_json(store, &ScheduleKey::named(ScheduleKey::STAFF), &staff)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(router(&Config::default(), store), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_directories_and_search() {
    let store = Arc::new(MemoryStore::new());
    store_directories(store.as_ref()).await;
    let app = router(&Config::default(), store);

    let (status, body) = send(app.clone(), "GET", "/api/groups").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0], json!({"id": "531030143", "number": "6101-090301D"}));

    let (status, body) = send(app.clone(), "GET", "/api/staff").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Васин Александр Владимирович");

    let (status, body) = send(app.clone(), "GET", "/api/search?q=090301").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups"].as_array().unwrap().len(), 2);
    assert!(body["staff"].as_array().unwrap().is_empty());

    let (_, body) = send(app.clone(), "GET", "/api/search?q=%D0%B2%D0%B0%D1%81%D0%B8%D0%BD").await;
    assert_eq!(body["staff"][0]["id"], "333991624-vasin");

    let (status, body) = send(app, "GET", "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"groups": [], "staff": []}));
}

#[tokio::test]
async fn test_missing_directory_is_server_error() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = send(router(&Config::default(), store), "GET", "/api/groups").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("groups.json"));
}

#[tokio::test]
async fn test_schedule_not_found_then_refreshed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rasp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture("schedule_week.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let app = router(&config_for(&mock_server.uri()), store);

    let (status, body) = send(app.clone(), "GET", "/api/schedule?groupId=531030143&week=5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/refresh-schedule?groupId=531030143&week=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["key"], "schedule_group_531030143_5");
    assert_eq!(body["cells"], 12);
    assert_eq!(body["removed"], 7);

    let (status, body) = send(app.clone(), "GET", "/api/schedule?groupId=531030143&week=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["for"], "specific");
    assert_eq!(body["data"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"][1][0]["message"], "No lessons on this time");

    let (status, body) = send(app, "GET", "/api/schedule?groupId=531030143&week=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["for"], "fallback");
    assert_eq!(body["meta"]["key"], "schedule");
}

#[tokio::test]
async fn test_refresh_requires_subject() {
    let store = Arc::new(MemoryStore::new());
    let app = router(&Config::default(), store);

    let (status, body) = send(app.clone(), "POST", "/api/refresh-schedule").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    let (status, _) = send(app, "POST", "/api/refresh-schedule?groupId=&week=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_rejects_foreign_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let app = router(&config_for(&mock_server.uri()), store.clone());

    let (status, body) = send(
        app,
        "POST",
        "/api/refresh-schedule?url=https%3A%2F%2Fexample.com%2Frasp%3FgroupId%3D1",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_refresh_timeout_is_gateway_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(fixture("schedule_week.html"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri());
    let store: Arc<dyn ScheduleStore> = Arc::new(MemoryStore::new());
    let service = ScheduleService::new(&config, store.clone()).unwrap();

    let state = AppState {
        service: Arc::new(service),
        store: store.clone(),
        refresh_timeout: Duration::from_millis(300),
        search_limit: config.server.search_limit,
        start_time: Instant::now(),
    };

    let (status, body) = send(
        create_router(state),
        "POST",
        "/api/refresh-schedule?staffId=42&week=1",
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["ok"], false);
    assert!(store.read(&ScheduleKey::fallback()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_static_files_served_from_public_dir() {
    let public = tempfile::TempDir::new().unwrap();
    std::fs::write(public.path().join("index.html"), "<h1>Timetable</h1>").unwrap();

    let mut config = Config::default();
    config.server.public_dir = Some(public.path().to_path_buf());

    let response = router(&config, Arc::new(MemoryStore::new()))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>Timetable</h1>");
}

#[tokio::test]
async fn test_refresh_write_failure_is_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rasp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture("schedule_week.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = router(&config_for(&mock_server.uri()), Arc::new(ReadOnlyStore));
    let (status, body) = send(app, "POST", "/api/refresh-schedule?groupId=1&week=2").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("Storage error"));
}
