//! Timetable enrollment endpoints.
//!
//! A timetable entry links a user to a class. Each user can enroll in a class
//! at most once; the schedule itself comes from the class's timings.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, TimetableEntry, TimetableRow},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub class_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub day: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(enroll))
        .route("/schedule", get(my_schedule))
        .route("/:id", delete(unenroll))
        .layer(axum::middleware::from_fn_with_state(state, require_auth))
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's timetable entries.
async fn list_entries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<TimetableEntry>>> {
    let entries = db::list_timetable_entries(&state.db, &auth.user_id).await?;
    Ok(Json(entries))
}

/// The caller's resolved schedule: enrolled classes joined to their timings.
async fn my_schedule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<TimetableRow>>> {
    let day = query.day.map(|d| d.to_lowercase());
    let rows = db::list_user_timetable(&state.db, &auth.user_id, day.as_deref()).await?;
    Ok(Json(rows))
}

/// Enroll the caller in a class. Duplicate enrollment returns 409.
async fn enroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<EnrollRequest>,
) -> Result<impl IntoResponse> {
    if request.class_id.trim().is_empty() {
        return Err(Error::Validation("classId is required".to_string()));
    }

    // Reject enrollment into classes that don't exist.
    let class = db::get_class(&state.db, &request.class_id).await?;

    let entry = db::create_timetable_entry(
        &state.db,
        &uuid::Uuid::new_v4().to_string(),
        &auth.user_id,
        &class.id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove one of the caller's timetable entries.
async fn unenroll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let entry = db::get_timetable_entry(&state.db, &id).await?;
    if entry.user_id != auth.user_id && !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    db::delete_timetable_entry(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "message": "Timetable entry deleted" })))
}
