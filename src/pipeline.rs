//! Refresh and lookup of cached schedules
//!
//! A refresh runs fetch → grid extraction → lesson normalization →
//! placeholder trimming and persists the result twice: under the key of the
//! request and under the fallback key. A lookup reads the specific key,
//! then the fallback, and never triggers a refresh.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{Config, SourceConfig};
use crate::crawler::{ScheduleFetcher, ScheduleRequest};
use crate::error::Result;
use crate::models::{SlotCell, SubjectKind};
use crate::parser::{extract_schedule, Trimmed};
use crate::storage::{read_json, to_stored_json, CachedSchedule, ScheduleKey, ScheduleStore};

/// Outcome of one successful refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Key specific to the request
    pub key: String,

    /// Fallback key written alongside
    pub fallback_key: String,

    /// URL the schedule was fetched from
    pub url: String,

    /// Whether a document was retrieved at all
    pub fetched: bool,

    /// Cells persisted
    pub cells: usize,

    /// Leading placeholders removed
    pub removed: usize,
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Cached under the requested subject and week
    Specific(CachedSchedule),
    /// Most recent refresh of any subject
    Fallback(CachedSchedule),
    /// Nothing cached
    NotFound,
}

impl Lookup {
    /// `"specific"` or `"fallback"`, `None` when not found
    pub fn origin(&self) -> Option<&'static str> {
        match self {
            Self::Specific(_) => Some("specific"),
            Self::Fallback(_) => Some("fallback"),
            Self::NotFound => None,
        }
    }

    /// Cached schedule, if any
    pub fn schedule(&self) -> Option<&CachedSchedule> {
        match self {
            Self::Specific(s) | Self::Fallback(s) => Some(s),
            Self::NotFound => None,
        }
    }
}

/// Schedule refresh and lookup service
#[derive(Clone)]
pub struct ScheduleService {
    fetcher: ScheduleFetcher,
    store: Arc<dyn ScheduleStore>,
    source: SourceConfig,
    remove_count: usize,
}

impl ScheduleService {
    /// Create a service from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &Config, store: Arc<dyn ScheduleStore>) -> Result<Self> {
        let fetcher = ScheduleFetcher::new(&config.source)?;
        Ok(Self::with_fetcher(
            fetcher,
            store,
            config.source.clone(),
            config.extraction.leading_placeholders,
        ))
    }

    /// Create a service around an existing fetcher
    pub fn with_fetcher(
        fetcher: ScheduleFetcher,
        store: Arc<dyn ScheduleStore>,
        source: SourceConfig,
        remove_count: usize,
    ) -> Self {
        Self {
            fetcher,
            store,
            source,
            remove_count,
        }
    }

    /// Backing store
    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    /// Fetcher used for schedule pages
    pub fn fetcher(&self) -> &ScheduleFetcher {
        &self.fetcher
    }

    /// Source site settings
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Fetch, extract and persist one schedule
    ///
    /// Fetch failures and missing page structure are logged and persist an
    /// empty schedule. Both keys are overwritten unconditionally, the
    /// fallback key first. A refresh cut off between the two writes leaves
    /// the fallback newer than the specific key, never the reverse.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTarget` before any network call when the
    /// request does not resolve to the source site, and `Error::Storage`
    /// when the result cannot be persisted
    #[instrument(skip(self), fields(remove_count = self.remove_count))]
    pub async fn refresh(&self, request: &ScheduleRequest) -> Result<RefreshReport> {
        let target = request.resolve(&self.source)?;
        info!(url = %target.url, key = %target.key, "Refreshing schedule");

        let page = self.fetcher.fetch_page(target.url.as_str()).await?;
        let fetched = page.is_some();

        let Trimmed { cells, removed } = match page {
            Some(html) => extract_schedule(&html, self.remove_count),
            None => Trimmed {
                cells: Vec::new(),
                removed: 0,
            },
        };

        let fallback = ScheduleKey::fallback();
        let text = to_stored_json(&target.key, &cells)?;
        self.store.write(&fallback, &text).await?;
        self.store.write(&target.key, &text).await?;

        info!(
            key = %target.key,
            cells = cells.len(),
            removed,
            "Schedule persisted"
        );

        Ok(RefreshReport {
            key: target.key.to_string(),
            fallback_key: fallback.to_string(),
            url: target.url.to_string(),
            fetched,
            cells: cells.len(),
            removed,
        })
    }

    /// Read a cached schedule, falling back to the most recent refresh
    ///
    /// The specific key is consulted only when both an id and a week are
    /// given.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the store cannot be read
    pub async fn lookup(
        &self,
        kind: SubjectKind,
        id: Option<&str>,
        week: Option<&str>,
    ) -> Result<Lookup> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        let week = week.map(str::trim).filter(|s| !s.is_empty());

        if let (Some(id), Some(week)) = (id, week) {
            let key = ScheduleKey::subject(kind, id, Some(week));
            if let Some(cells) = self.read_cells(&key).await? {
                return Ok(Lookup::Specific(CachedSchedule { key, cells }));
            }
        }

        let key = ScheduleKey::fallback();
        Ok(match self.read_cells(&key).await? {
            Some(cells) => Lookup::Fallback(CachedSchedule { key, cells }),
            None => Lookup::NotFound,
        })
    }

    async fn read_cells(&self, key: &ScheduleKey) -> Result<Option<Vec<SlotCell>>> {
        Ok(read_json(self.store.as_ref(), key).await?)
    }
}
