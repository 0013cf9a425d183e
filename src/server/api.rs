//! REST API handlers for the timetable server
//!
//! This module defines the routes consumed by the browser timetable: the
//! group and staff directories, search, cached schedule lookup and
//! on-demand refresh.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::crawler::ScheduleRequest;
use crate::directory::{self, Directory};
use crate::error::RaspErrorTrait;
use crate::models::{SlotCell, SubjectKind};
use crate::pipeline::{Lookup, RefreshReport};
use crate::storage::ScheduleKey;

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Error body returned with every non-2xx status
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }

    fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// Where a served schedule came from
#[derive(Debug, Serialize)]
pub struct ScheduleMeta {
    #[serde(rename = "for")]
    pub origin: &'static str,
    pub key: String,
}

/// Cached schedule response
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub meta: ScheduleMeta,
    pub data: Vec<SlotCell>,
}

/// Successful refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: RefreshReport,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Subject selection shared by lookup and refresh
#[derive(Debug, Default, Deserialize)]
pub struct SubjectParams {
    pub url: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "staffId")]
    pub staff_id: Option<String>,
    pub week: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SubjectParams {
    /// Refresh request: a URL, else a staff id, else a group id
    pub fn to_refresh_request(&self) -> Option<ScheduleRequest> {
        let week = present(&self.week);

        if let Some(url) = present(&self.url) {
            Some(ScheduleRequest::Url(url.to_string()))
        } else if let Some(id) = present(&self.staff_id) {
            Some(ScheduleRequest::subject(SubjectKind::Staff, id, week))
        } else {
            present(&self.group_id).map(|id| ScheduleRequest::subject(SubjectKind::Group, id, week))
        }
    }

    /// Lookup subject: a group id, else a staff id
    pub fn lookup_subject(&self) -> (SubjectKind, Option<&str>) {
        match (present(&self.group_id), present(&self.staff_id)) {
            (Some(id), _) => (SubjectKind::Group, Some(id)),
            (None, Some(id)) => (SubjectKind::Staff, Some(id)),
            (None, None) => (SubjectKind::Group, None),
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health_check))
        // Directory endpoints
        .route("/api/groups", get(list_groups))
        .route("/api/staff", get(list_staff))
        .route("/api/search", get(search))
        // Schedule endpoints
        .route("/api/schedule", get(get_schedule))
        .route("/api/refresh-schedule", post(refresh_schedule))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Directory Handlers
// ============================================================================

async fn load_directory(state: &AppState, name: &str) -> Result<Directory, Response> {
    match directory::load(state.store.as_ref(), name).await {
        Ok(Some(dir)) => Ok(dir),
        Ok(None) => Err(ErrorResponse::new(format!("{name}.json not found"))
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)),
        Err(e) => {
            error!(directory = name, error = %e, "Failed to read directory");
            Err(ErrorResponse::new("Failed to read directory")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// List all known groups
async fn list_groups(State(state): State<AppState>) -> Response {
    match load_directory(&state, ScheduleKey::GROUPS).await {
        Ok(groups) => Json(directory::group_entries(&groups)).into_response(),
        Err(response) => response,
    }
}

/// List all known staff members
async fn list_staff(State(state): State<AppState>) -> Response {
    match load_directory(&state, ScheduleKey::STAFF).await {
        Ok(staff) => Json(directory::staff_entries(&staff)).into_response(),
        Err(response) => response,
    }
}

/// Search groups and staff by substring
async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    if params.q.trim().is_empty() {
        return Json(directory::SearchResults::default()).into_response();
    }

    let store = state.store.as_ref();
    let (groups, staff) = match (
        directory::load(store, ScheduleKey::GROUPS).await,
        directory::load(store, ScheduleKey::STAFF).await,
    ) {
        (Ok(groups), Ok(staff)) => (groups.unwrap_or_default(), staff.unwrap_or_default()),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to read directories for search");
            return ErrorResponse::new("Failed to search")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Json(directory::search(
        &groups,
        &staff,
        &params.q,
        state.search_limit,
    ))
    .into_response()
}

// ============================================================================
// Schedule Handlers
// ============================================================================

/// Cached schedule for a subject and week, or the most recent one
async fn get_schedule(
    State(state): State<AppState>,
    Query(params): Query<SubjectParams>,
) -> Response {
    let (kind, id) = params.lookup_subject();

    match state
        .service
        .lookup(kind, id, present(&params.week))
        .await
    {
        Ok(lookup) => {
            let origin = lookup.origin();
            match (origin, lookup) {
                (Some(origin), Lookup::Specific(s) | Lookup::Fallback(s)) => {
                    Json(ScheduleResponse {
                        meta: ScheduleMeta {
                            origin,
                            key: s.key.to_string(),
                        },
                        data: s.cells,
                    })
                    .into_response()
                }
                _ => ErrorResponse::new(
                    "Schedule not found. Call /api/refresh-schedule first",
                )
                .into_response_with(StatusCode::NOT_FOUND),
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to read schedule");
            ErrorResponse::new("Failed to read schedule")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Refresh a schedule from the source site within the configured budget
async fn refresh_schedule(
    State(state): State<AppState>,
    Query(params): Query<SubjectParams>,
) -> Response {
    let Some(request) = params.to_refresh_request() else {
        return ErrorResponse::new("Provide url or staffId or (groupId and week)")
            .into_response_with(StatusCode::BAD_REQUEST);
    };

    let outcome = tokio::time::timeout(state.refresh_timeout, state.service.refresh(&request)).await;

    match outcome {
        Ok(Ok(report)) => (
            StatusCode::OK,
            Json(RefreshResponse { ok: true, report }),
        )
            .into_response(),
        Ok(Err(e)) => {
            let category = e.category();
            if category.is_client_error() {
                warn!(error = %e, "Refresh rejected");
                ErrorResponse::new(e.to_string()).into_response_with(StatusCode::BAD_REQUEST)
            } else {
                error!(
                    error = %e,
                    category = category.description(),
                    recoverable = e.is_recoverable(),
                    "Refresh failed"
                );
                ErrorResponse::new(e.to_string())
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
        Err(_) => {
            warn!(
                budget_secs = state.refresh_timeout.as_secs(),
                ?request,
                "Refresh exceeded its time budget"
            );
            ErrorResponse::new("Refresh timed out").into_response_with(StatusCode::GATEWAY_TIMEOUT)
        }
    }
}
