//! Persistence of extracted schedules and the group/staff directory
//!
//! Values are stored as pretty-printed JSON documents under sanitized
//! keys. The backend is injected through the [`ScheduleStore`] trait.

pub mod repository;

pub use repository::{FileStore, MemoryStore, ScheduleStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::models::{SlotCell, SubjectKind};
use crate::utils::error::StorageError;
use crate::utils::{sanitize_key_part, sha256_hex};

/// Storage identifier of one cached document
///
/// Built only from sanitized parts, so it is always safe as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey(String);

impl ScheduleKey {
    /// Key always overwritten with the most recent refresh
    pub const FALLBACK: &'static str = "schedule";

    /// Key of the group directory
    pub const GROUPS: &'static str = "groups";

    /// Key of the staff directory
    pub const STAFF: &'static str = "staff";

    /// The "most recent schedule" alias
    #[must_use]
    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    /// Key of a subject schedule, e.g. `schedule_group_531030143_5`
    ///
    /// Without a week the key is `schedule_{kind}_{id}`.
    pub fn subject(kind: SubjectKind, id: &str, week: Option<&str>) -> Self {
        let mut key = format!("schedule_{}_{}", kind.as_str(), sanitize_key_part(id));
        if let Some(week) = week {
            key.push('_');
            key.push_str(&sanitize_key_part(week));
        }
        Self(key)
    }

    /// Key of an arbitrary URL without subject parameters
    pub fn for_url(url: &str) -> Self {
        Self(format!("schedule_url_{}", sha256_hex(url)))
    }

    /// Free-form key, sanitized like every other key part
    pub fn named(name: &str) -> Self {
        let sanitized = sanitize_key_part(name);
        if sanitized.is_empty() {
            Self::fallback()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the fallback alias
    pub fn is_fallback(&self) -> bool {
        self.0 == Self::FALLBACK
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filtered cell sequence together with the key it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSchedule {
    pub key: ScheduleKey,
    pub cells: Vec<SlotCell>,
}

/// Serialize a value the way every stored document is written
///
/// Pretty JSON with a four-space indent and a stable field order.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if the value cannot be serialized
pub fn to_stored_json<T: Serialize + ?Sized>(
    key: &ScheduleKey,
    value: &T,
) -> Result<String, StorageError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

    value
        .serialize(&mut serializer)
        .map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serialize and write a value under `key`
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn ScheduleStore,
    key: &ScheduleKey,
    value: &T,
) -> Result<(), StorageError> {
    let text = to_stored_json(key, value)?;
    store.write(key, &text).await
}

/// Read and decode a stored value
///
/// A document that does not decode is logged and treated as absent.
///
/// # Errors
///
/// Returns `StorageError::Read` if the backend cannot be read
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn ScheduleStore,
    key: &ScheduleKey,
) -> Result<Option<T>, StorageError> {
    let Some(text) = store.read(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Ignoring unparsable stored document");
            Ok(None)
        }
    }
}
