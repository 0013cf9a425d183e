//! Schedule targets: validation and URL construction
//!
//! A refresh is requested either for a subject (group or staff member and a
//! week) or for an arbitrary schedule URL. Both resolve to a validated URL on
//! the source site plus the storage key the result is cached under.

use url::Url;

use crate::config::SourceConfig;
use crate::models::SubjectKind;
use crate::storage::ScheduleKey;
use crate::utils::error::FetchError;

/// Week used when a subject is requested without one
pub const DEFAULT_WEEK: &str = "1";

/// Query parameter carrying the week number
pub const WEEK_PARAM: &str = "selectedWeek";

/// What a refresh should fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleRequest {
    /// Schedule of one group or staff member for one week
    Subject {
        kind: SubjectKind,
        id: String,
        week: String,
    },
    /// Arbitrary schedule page URL
    Url(String),
}

/// Validated fetch target with its storage key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub url: Url,
    pub key: ScheduleKey,
}

impl ScheduleRequest {
    /// Subject request, defaulting the week when none is given
    pub fn subject(kind: SubjectKind, id: impl Into<String>, week: Option<&str>) -> Self {
        let week = week
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .unwrap_or(DEFAULT_WEEK);

        Self::Subject {
            kind,
            id: id.into().trim().to_string(),
            week: week.to_string(),
        }
    }

    /// Resolve into a validated URL and storage key
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidTarget` for an empty subject id, an
    /// unparsable URL, a non-HTTP scheme or a host outside the allowed domain
    pub fn resolve(&self, source: &SourceConfig) -> Result<ResolvedTarget, FetchError> {
        match self {
            Self::Subject { kind, id, week } => {
                if id.is_empty() {
                    return Err(FetchError::InvalidTarget(format!("{kind} id is required")));
                }

                let url = subject_url(&source.base_url, *kind, id, week)?;
                let url = validate_target(url.as_str(), &source.allowed_domain)?;

                Ok(ResolvedTarget {
                    url,
                    key: ScheduleKey::subject(*kind, id, Some(week)),
                })
            }
            Self::Url(raw) => {
                let raw = raw.trim();
                let url = validate_target(raw, &source.allowed_domain)?;
                let key = key_from_query(&url).unwrap_or_else(|| ScheduleKey::for_url(raw));

                Ok(ResolvedTarget { url, key })
            }
        }
    }
}

/// Build the schedule page URL of a subject
///
/// # Errors
///
/// Returns `FetchError::InvalidTarget` if `base_url` cannot be parsed
pub fn subject_url(
    base_url: &str,
    kind: SubjectKind,
    id: &str,
    week: &str,
) -> Result<Url, FetchError> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join("/rasp"))
        .map_err(|e| FetchError::InvalidTarget(format!("{base_url}: {e}")))?;

    url.query_pairs_mut()
        .append_pair(kind.query_param(), id)
        .append_pair(WEEK_PARAM, week);

    Ok(url)
}

/// Check that a URL points at the source site
///
/// The host must equal `allowed_domain` or be one of its subdomains. This
/// runs before any network activity.
///
/// # Errors
///
/// Returns `FetchError::InvalidTarget` describing the rejection
pub fn validate_target(raw: &str, allowed_domain: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidTarget(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidTarget(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| FetchError::InvalidTarget(format!("{raw}: missing host")))?;

    if !host_matches(host, allowed_domain) {
        return Err(FetchError::InvalidTarget(format!(
            "host must be {allowed_domain}, got {host}"
        )));
    }

    Ok(url)
}

fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();

    host == domain
        || host
            .strip_suffix(&domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Storage key from subject parameters carried in a URL query
///
/// `groupId` takes precedence over `staffId`.
fn key_from_query(url: &Url) -> Option<ScheduleKey> {
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.trim().is_empty())
    };

    let week = param(WEEK_PARAM);

    [SubjectKind::Group, SubjectKind::Staff]
        .into_iter()
        .find_map(|kind| param(kind.query_param()).map(|id| (kind, id)))
        .map(|(kind, id)| ScheduleKey::subject(kind, &id, week.as_deref()))
}
