//! Class catalog endpoints.
//!
//! Classes and their timings are readable by anyone; mutation is admin-only.
//! Deleting a class intentionally leaves its timings behind.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, Class, ClassTiming, CreateClass, CreateClassTiming},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

const DAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub semester: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimingRequest {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_classes))
        .route("/:id", get(get_class))
        .route("/:id/timings", get(list_timings));

    let protected = Router::new()
        .route("/", post(create_class))
        .route("/:id", axum::routing::delete(delete_class))
        .route("/:id/timings", post(create_timing))
        .route("/:id/timings/:timing_id", axum::routing::delete(delete_timing))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<Class>>> {
    let classes = db::list_classes(&state.db).await?;
    Ok(Json(classes))
}

async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Class>> {
    let class = db::get_class(&state.db, &id).await?;
    Ok(Json(class))
}

/// Create a class (admin only).
async fn create_class(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateClassRequest>,
) -> Result<impl IntoResponse> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    if request.name.trim().is_empty() {
        return Err(Error::Validation("Class name is required".to_string()));
    }
    if request.semester.trim().is_empty() {
        return Err(Error::Validation("Semester is required".to_string()));
    }

    let class = db::create_class(
        &state.db,
        CreateClass {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            semester: request.semester.trim().to_string(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(class)))
}

/// Delete a class (admin only). Timings for the class are not removed.
async fn delete_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    db::delete_class(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "message": "Class deleted" })))
}

async fn list_timings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ClassTiming>>> {
    let timings = db::list_class_timings(&state.db, &id).await?;
    Ok(Json(timings))
}

/// Add a timing to a class (admin only).
async fn create_timing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateTimingRequest>,
) -> Result<impl IntoResponse> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    let day = request.day.to_lowercase();
    if !DAYS.contains(&day.as_str()) {
        return Err(Error::Validation(format!(
            "Day must be one of: {}",
            DAYS.join(", ")
        )));
    }
    if request.start_time.trim().is_empty() || request.end_time.trim().is_empty() {
        return Err(Error::Validation(
            "Start time and end time are required".to_string(),
        ));
    }

    // Timing rows must reference an existing class at creation time.
    let class = db::get_class(&state.db, &id).await?;

    let timing = db::create_class_timing(
        &state.db,
        CreateClassTiming {
            id: uuid::Uuid::new_v4().to_string(),
            class_id: class.id,
            day,
            start_time: request.start_time,
            end_time: request.end_time,
            instructor: request.instructor,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(timing)))
}

/// Remove a timing (admin only).
async fn delete_timing(
    State(state): State<AppState>,
    Path((_id, timing_id)): Path<(String, String)>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    db::delete_class_timing(&state.db, &timing_id).await?;
    Ok(Json(serde_json::json!({ "message": "Class timing deleted" })))
}
