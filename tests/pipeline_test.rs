//! End-to-end tests of the refresh and lookup pipeline
//!
//! The source site is a wiremock server serving the saved schedule page.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use common::{config_for, fixture, ReadOnlyStore};
use rasp::crawler::ScheduleRequest;
use rasp::error::{Error, StorageError};
use rasp::models::{SlotCell, SubjectKind};
use rasp::pipeline::{Lookup, ScheduleService};
use rasp::storage::{FileStore, MemoryStore, ScheduleKey, ScheduleStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_week(mock_server: &MockServer, group: &str, week: &str) {
    Mock::given(method("GET"))
        .and(path("/rasp"))
        .and(query_param("groupId", group))
        .and(query_param("selectedWeek", week))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(fixture("schedule_week.html")),
        )
        .mount(mock_server)
        .await;
}

fn memory_service(mock_uri: &str) -> (ScheduleService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = ScheduleService::new(&config_for(mock_uri), store.clone()).unwrap();
    (service, store)
}

#[tokio::test]
async fn test_refresh_persists_specific_and_fallback() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    let (service, store) = memory_service(&mock_server.uri());
    let request = ScheduleRequest::subject(SubjectKind::Group, "531030143", Some("5"));

    let report = service.refresh(&request).await.unwrap();
    assert_eq!(report.key, "schedule_group_531030143_5");
    assert_eq!(report.fallback_key, "schedule");
    assert!(report.fetched);
    assert_eq!(report.cells, 12);
    assert_eq!(report.removed, 7);

    let specific = store
        .read(&ScheduleKey::subject(SubjectKind::Group, "531030143", Some("5")))
        .await
        .unwrap()
        .unwrap();
    let fallback = store.read(&ScheduleKey::fallback()).await.unwrap().unwrap();
    assert_eq!(specific, fallback);
    assert!(specific.starts_with("[\n    [\n        {"));
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp.path()));
    let service =
        ScheduleService::new(&config_for(&mock_server.uri()), store.clone()).unwrap();
    let request = ScheduleRequest::subject(SubjectKind::Group, "531030143", Some("5"));

    service.refresh(&request).await.unwrap();
    let first = std::fs::read(temp.path().join("schedule_group_531030143_5.json")).unwrap();

    service.refresh(&request).await.unwrap();
    let second = std::fs::read(temp.path().join("schedule_group_531030143_5.json")).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        second,
        std::fs::read(temp.path().join("schedule.json")).unwrap()
    );
}

#[tokio::test]
async fn test_lookup_specific_fallback_and_not_found() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    let (service, _store) = memory_service(&mock_server.uri());

    let lookup = service
        .lookup(SubjectKind::Group, Some("531030143"), Some("5"))
        .await
        .unwrap();
    assert_eq!(lookup, Lookup::NotFound);

    service
        .refresh(&ScheduleRequest::subject(
            SubjectKind::Group,
            "531030143",
            Some("5"),
        ))
        .await
        .unwrap();

    let lookup = service
        .lookup(SubjectKind::Group, Some("531030143"), Some("5"))
        .await
        .unwrap();
    assert_eq!(lookup.origin(), Some("specific"));
    assert_eq!(lookup.schedule().unwrap().cells.len(), 12);

    // Another week was never refreshed
    let lookup = service
        .lookup(SubjectKind::Group, Some("531030143"), Some("6"))
        .await
        .unwrap();
    assert_eq!(lookup.origin(), Some("fallback"));
    assert!(lookup.schedule().unwrap().key.is_fallback());

    // Without a week the specific key is not consulted
    let lookup = service
        .lookup(SubjectKind::Group, Some("531030143"), None)
        .await
        .unwrap();
    assert!(matches!(lookup, Lookup::Fallback(_)));
}

#[tokio::test]
async fn test_lookup_never_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (service, _store) = memory_service(&mock_server.uri());
    let lookup = service
        .lookup(SubjectKind::Staff, Some("42"), Some("1"))
        .await
        .unwrap();

    assert_eq!(lookup, Lookup::NotFound);
}

#[tokio::test]
async fn test_fetch_failure_stores_empty_schedule() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (service, store) = memory_service(&mock_server.uri());
    let report = service
        .refresh(&ScheduleRequest::subject(SubjectKind::Staff, "42", None))
        .await
        .unwrap();

    assert!(!report.fetched);
    assert_eq!(report.cells, 0);
    assert_eq!(report.key, "schedule_staff_42_1");

    let stored = store.read(&ScheduleKey::fallback()).await.unwrap();
    assert_eq!(stored.as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_missing_structure_stores_empty_schedule() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture("no_timetable.html")))
        .mount(&mock_server)
        .await;

    let (service, _store) = memory_service(&mock_server.uri());
    let report = service
        .refresh(&ScheduleRequest::subject(SubjectKind::Group, "1", Some("2")))
        .await
        .unwrap();

    assert!(report.fetched);
    assert_eq!(report.cells, 0);
    assert_eq!(report.removed, 0);

    let lookup = service
        .lookup(SubjectKind::Group, Some("1"), Some("2"))
        .await
        .unwrap();
    assert_eq!(lookup.schedule().unwrap().cells, Vec::<SlotCell>::new());
}

#[tokio::test]
async fn test_invalid_target_makes_no_request_and_no_write() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (service, store) = memory_service(&mock_server.uri());

    let result = service
        .refresh(&ScheduleRequest::Url(
            "https://example.com/rasp?groupId=1".to_string(),
        ))
        .await;
    assert!(matches!(result, Err(Error::InvalidTarget(_))));

    let result = service
        .refresh(&ScheduleRequest::subject(SubjectKind::Group, "  ", Some("1")))
        .await;
    assert!(matches!(result, Err(Error::InvalidTarget(_))));

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_url_request_keys() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    Mock::given(method("GET"))
        .and(path("/rasp/other"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture("schedule_week.html")))
        .mount(&mock_server)
        .await;

    let (service, _store) = memory_service(&mock_server.uri());

    let url = format!("{}/rasp?groupId=531030143&selectedWeek=5", mock_server.uri());
    let report = service.refresh(&ScheduleRequest::Url(url)).await.unwrap();
    assert_eq!(report.key, "schedule_group_531030143_5");

    let url = format!("{}/rasp/other", mock_server.uri());
    let report = service.refresh(&ScheduleRequest::Url(url.clone())).await.unwrap();
    assert_eq!(report.key, ScheduleKey::for_url(&url).to_string());
    assert_eq!(report.cells, 12);
}

#[tokio::test]
async fn test_write_failure_propagates() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    let service =
        ScheduleService::new(&config_for(&mock_server.uri()), Arc::new(ReadOnlyStore)).unwrap();

    let result = service
        .refresh(&ScheduleRequest::subject(
            SubjectKind::Group,
            "531030143",
            Some("5"),
        ))
        .await;

    match result {
        Err(Error::Storage(StorageError::Write { key, .. })) => assert_eq!(key, "schedule"),
        other => panic!("expected a storage write error, got {other:?}"),
    }
}

/// Memory store that records the order of written keys
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<String>>,
}

#[async_trait]
impl ScheduleStore for RecordingStore {
    async fn read(&self, key: &ScheduleKey) -> Result<Option<String>, StorageError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &ScheduleKey, value: &str) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.write(key, value).await
    }
}

#[tokio::test]
async fn test_refresh_writes_fallback_before_specific() {
    let mock_server = MockServer::start().await;
    mount_week(&mock_server, "531030143", "5").await;

    let store = Arc::new(RecordingStore::default());
    let service =
        ScheduleService::new(&config_for(&mock_server.uri()), store.clone()).unwrap();

    service
        .refresh(&ScheduleRequest::subject(
            SubjectKind::Group,
            "531030143",
            Some("5"),
        ))
        .await
        .unwrap();

    assert_eq!(
        *store.writes.lock().unwrap(),
        vec!["schedule".to_string(), "schedule_group_531030143_5".to_string()]
    );
}
