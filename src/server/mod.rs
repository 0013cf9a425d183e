//! HTTP surface of the timetable
//!
//! Serves the cached schedules, the group/staff directory and on-demand
//! refresh to the browser UI.

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

pub use api::create_router;
pub use server::{AppState, ServerError, ServerInfo, TimetableServer};
