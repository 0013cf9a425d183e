//! Common test utilities

use async_trait::async_trait;
use rasp::config::Config;
use rasp::error::StorageError;
use rasp::storage::{ScheduleKey, ScheduleStore};
use std::path::PathBuf;

/// Load an HTML fixture from `tests/fixtures/html`
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/html")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

/// Configuration pointing the source site at a mock server
///
/// The mock server listens on 127.0.0.1, which becomes the allowed domain.
#[allow(dead_code)]
pub fn config_for(mock_uri: &str) -> Config {
    let mut config = Config::default();
    config.source.base_url = mock_uri.to_string();
    config.source.allowed_domain = "127.0.0.1".to_string();
    config.source.request_timeout_secs = 5;
    config.source.requests_per_second = 100;
    config
}

/// Schedule page with only the grid items replaced
#[allow(dead_code)]
pub fn schedule_page(items: &str) -> String {
    format!(
        r#"<html><body><div class="container timetable">
             <div class="card-default timetable-card"><div class="schedule">
               <div class="schedule__items">{items}</div>
             </div></div>
           </div></body></html>"#
    )
}

/// Store that reads nothing and rejects every write
#[allow(dead_code)]
pub struct ReadOnlyStore;

#[async_trait]
impl ScheduleStore for ReadOnlyStore {
    async fn read(&self, _key: &ScheduleKey) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn write(&self, key: &ScheduleKey, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}
