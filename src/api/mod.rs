//! API Routes for Campus Hub
//!
//! This module combines all API routes into a single router.
//! Routes are organized by domain and apply appropriate middleware.

mod announcements;
mod auth;
mod chatbot;
mod classes;
mod lostfound;
pub mod status;
mod timetables;
mod uploads;

use axum::Router;

use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /api/auth/* - Registration, login, profile (mixed public/protected)
/// - /api/announcements/* - Public reads, admin-gated mutation
/// - /api/classes/* - Public reads, admin-gated mutation
/// - /api/lostfound/* - Public reads, owner-or-admin-gated mutation
/// - /api/timetables/* - Per-user enrollments (protected)
/// - /api/upload/* - Profile image upload (protected)
/// - /api/chatbot/* - Unauthenticated mirrors for assistant context
/// - /health - Health check (public)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/announcements", announcements::routes(state.clone()))
        .nest("/api/classes", classes::routes(state.clone()))
        .nest("/api/lostfound", lostfound::routes(state.clone()))
        .nest("/api/timetables", timetables::routes(state.clone()))
        .nest("/api/upload", uploads::routes(state))
        .nest("/api/chatbot", chatbot::routes())
}
