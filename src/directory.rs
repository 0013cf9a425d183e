//! Directory of groups and staff members
//!
//! Crawls the faculty and staff listings of the source site to build the
//! `{id: label}` maps used for search, and persists them under the `groups`
//! and `staff` keys. Every page failure is logged and skipped.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::SourceConfig;
use crate::crawler::ScheduleFetcher;
use crate::error::{Error, Result};
use crate::parser::selectors::{
    FACULTY_LINK, GROUP_CATALOG_LINK, SPAN, STAFF_COLUMN, STAFF_CONTAINER, STAFF_LINK,
    STAFF_LIST, STAFF_ROW,
};
use crate::storage::{read_json, write_json, ScheduleKey, ScheduleStore};
use crate::utils::error::FetchError;
use crate::utils::{non_empty, normalize_whitespace};

/// Map of id to display label, sorted by id
pub type Directory = BTreeMap<String, String>;

/// Highest course number a faculty can list
pub const MAX_COURSE: u32 = 6;

/// Staff listing pages crawled by default
pub const DEFAULT_STAFF_PAGES: u32 = 129;

/// Label stored when a group link carries no number
pub const MISSING_GROUP_NUMBER: &str = "Номер не найден";

/// Group entry of the public API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub id: String,
    pub number: String,
}

/// Staff entry of the public API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffEntry {
    pub id: String,
    pub name: String,
}

/// Search hits over both directories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub groups: Vec<GroupEntry>,
    pub staff: Vec<StaffEntry>,
}

/// Directory entries as group records
pub fn group_entries(groups: &Directory) -> Vec<GroupEntry> {
    groups
        .iter()
        .map(|(id, number)| GroupEntry {
            id: id.clone(),
            number: number.clone(),
        })
        .collect()
}

/// Directory entries as staff records
pub fn staff_entries(staff: &Directory) -> Vec<StaffEntry> {
    staff
        .iter()
        .map(|(id, name)| StaffEntry {
            id: id.clone(),
            name: name.clone(),
        })
        .collect()
}

/// Case-insensitive substring search over group numbers and staff names
///
/// At most `limit` hits of each kind. A blank query matches nothing.
pub fn search(groups: &Directory, staff: &Directory, query: &str, limit: usize) -> SearchResults {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }

    let matching = |dir: &Directory| -> Vec<(String, String)> {
        dir.iter()
            .filter(|(_, label)| label.to_lowercase().contains(&needle))
            .take(limit)
            .map(|(id, label)| (id.clone(), label.clone()))
            .collect()
    };

    SearchResults {
        groups: matching(groups)
            .into_iter()
            .map(|(id, number)| GroupEntry { id, number })
            .collect(),
        staff: matching(staff)
            .into_iter()
            .map(|(id, name)| StaffEntry { id, name })
            .collect(),
    }
}

/// Load a persisted directory, `None` when absent or unparsable
///
/// # Errors
///
/// Returns `Error::Storage` if the store cannot be read
pub async fn load(store: &dyn ScheduleStore, name: &str) -> Result<Option<Directory>> {
    Ok(read_json(store, &ScheduleKey::named(name)).await?)
}

// ============================================================================
// Page Parsing
// ============================================================================

/// Faculties listed on the schedule index page as `(id, name)`
pub fn parse_faculties(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);

    document
        .select(&FACULTY_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let id = href
                .split_once("/rasp/faculty/")
                .map(|(_, rest)| rest.split(['?', '#']).next().unwrap_or(rest))?;
            let id = non_empty(id)?;
            Some((id, text_of(link).unwrap_or_default()))
        })
        .collect()
}

/// Groups listed on one course page as `(id, number)`
pub fn parse_group_catalog(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);

    document
        .select(&GROUP_CATALOG_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let id = href
                .split_once("groupId=")
                .map(|(_, rest)| rest.split(['&', '#']).next().unwrap_or(rest))?;
            let id = non_empty(id)?;
            let number = link
                .select(&SPAN)
                .next()
                .and_then(text_of)
                .unwrap_or_else(|| MISSING_GROUP_NUMBER.to_string());
            Some((id, number))
        })
        .collect()
}

/// Staff members listed on one staff page as `(id, name)`
///
/// Returns `None` when the page lacks the expected listing structure.
pub fn parse_staff_page(html: &str) -> Option<Vec<(String, String)>> {
    let document = Html::parse_document(html);

    let container = document
        .select(&STAFF_CONTAINER)
        .find(|el| el.value().attr("class").map(str::trim) == Some("container"))?;
    let row = container.select(&STAFF_ROW).nth(1)?;
    let column = row.select(&STAFF_COLUMN).next()?;
    let list = column.select(&STAFF_LIST).next()?;

    Some(
        list.select(&STAFF_LINK)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let id = non_empty(href.trim_end_matches('/').rsplit('/').next()?)?;
                let name = text_of(link)?;
                Some((id, name))
            })
            .collect(),
    )
}

// Labels may wrap across lines in the listing markup
fn text_of(element: ElementRef<'_>) -> Option<String> {
    non_empty(&normalize_whitespace(&element.text().collect::<String>()))
}

// ============================================================================
// Crawler
// ============================================================================

/// Paced crawler of the group and staff listings
pub struct DirectoryCrawler {
    fetcher: ScheduleFetcher,
    base_url: Url,
    store: Arc<dyn ScheduleStore>,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl DirectoryCrawler {
    /// Create a crawler for the configured source site
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unparsable base URL and `Error::Fetch`
    /// if the HTTP client cannot be created
    pub fn new(source: &SourceConfig, store: Arc<dyn ScheduleStore>) -> Result<Self> {
        let fetcher = ScheduleFetcher::new(source)?;
        let base_url = Url::parse(&source.base_url)
            .map_err(|e| Error::config(format!("invalid base_url {}: {e}", source.base_url)))?;

        let rate = NonZeroU32::new(source.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            fetcher,
            base_url,
            store,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
        })
    }

    /// Crawl every faculty's courses and persist the group directory
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the directory cannot be persisted
    pub async fn refresh_groups(&self) -> Result<Directory> {
        let index = self.page_url("/rasp", &[])?;
        let Some(html) = self.fetch_logged(&index).await else {
            warn!("Faculty index unavailable, group directory not updated");
            return Ok(Directory::new());
        };

        let faculties = parse_faculties(&html);
        info!(faculties = faculties.len(), "Found faculties");

        let mut groups = Directory::new();
        for (position, (faculty_id, faculty_name)) in faculties.iter().enumerate() {
            info!(
                faculty = %faculty_name,
                id = %faculty_id,
                progress = %format!("{}/{}", position + 1, faculties.len()),
                "Collecting groups"
            );
            groups.extend(self.crawl_faculty(faculty_id).await?);
        }

        write_json(self.store.as_ref(), &ScheduleKey::named(ScheduleKey::GROUPS), &groups)
            .await?;
        info!(groups = groups.len(), "Group directory stored");
        Ok(groups)
    }

    async fn crawl_faculty(&self, faculty_id: &str) -> Result<Directory> {
        let mut groups = Directory::new();

        for course in 1..=MAX_COURSE {
            let url = self.page_url(
                &format!("/rasp/faculty/{faculty_id}"),
                &[("course", &course.to_string())],
            )?;

            self.rate_limiter.until_ready().await;
            match self.fetcher.try_fetch(url.as_str()).await {
                Ok(html) => {
                    let found = parse_group_catalog(&html);
                    info!(course, groups = found.len(), "Processed course");
                    groups.extend(found);
                }
                Err(FetchError::Status(404)) => {
                    info!(course, "Course does not exist, moving on");
                    break;
                }
                Err(FetchError::InvalidTarget(msg)) => return Err(Error::InvalidTarget(msg)),
                Err(e) => warn!(course, faculty = %faculty_id, error = %e, "Failed to fetch course"),
            }
        }

        Ok(groups)
    }

    /// Crawl staff listing pages `1..=pages` and persist the staff directory
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the directory cannot be persisted
    pub async fn refresh_staff(&self, pages: u32) -> Result<Directory> {
        let mut staff = Directory::new();

        for page in 1..=pages {
            let url = self.page_url("/staff", &[("page", &page.to_string())])?;
            let Some(html) = self.fetch_logged(&url).await else {
                continue;
            };

            match parse_staff_page(&html) {
                Some(found) => {
                    info!(page, staff = found.len(), "Processed staff page");
                    staff.extend(found);
                }
                None => warn!(page, "Staff listing not found on page, skipping"),
            }
        }

        write_json(self.store.as_ref(), &ScheduleKey::named(ScheduleKey::STAFF), &staff)
            .await?;
        info!(staff = staff.len(), "Staff directory stored");
        Ok(staff)
    }

    async fn fetch_logged(&self, url: &Url) -> Option<String> {
        self.rate_limiter.until_ready().await;
        match self.fetcher.fetch_page(url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping page");
                None
            }
        }
    }

    fn page_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::config(format!("cannot build {path}: {e}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }
}
