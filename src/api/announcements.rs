//! Announcement endpoints.
//!
//! Anyone can read announcements; creating, editing, and deleting them is
//! admin-only.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, Announcement, CreateAnnouncement, UpdateAnnouncement},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

const CATEGORIES: &[&str] = &["academic", "event", "general", "urgent"];
const PRIORITIES: &[&str] = &["low", "medium", "high"];

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(list_announcements));

    let protected = Router::new()
        .route("/", post(create_announcement))
        .route("/:id", put(update_announcement).delete(delete_announcement))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

fn validate_category(category: &str) -> Result<()> {
    if !CATEGORIES.contains(&category) {
        return Err(Error::Validation(format!(
            "Category must be one of: {}",
            CATEGORIES.join(", ")
        )));
    }
    Ok(())
}

fn validate_priority(priority: &str) -> Result<()> {
    if !PRIORITIES.contains(&priority) {
        return Err(Error::Validation(format!(
            "Priority must be one of: {}",
            PRIORITIES.join(", ")
        )));
    }
    Ok(())
}

/// List announcements, newest first.
async fn list_announcements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let announcements = db::list_announcements(&state.db, query.category.as_deref()).await?;
    Ok(Json(announcements))
}

/// Create a new announcement (admin only).
async fn create_announcement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    if request.title.trim().is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    if request.content.trim().is_empty() {
        return Err(Error::Validation("Content is required".to_string()));
    }

    let category = request.category.unwrap_or_else(|| "general".to_string());
    validate_category(&category)?;
    let priority = request.priority.unwrap_or_else(|| "medium".to_string());
    validate_priority(&priority)?;

    let author = db::get_user(&state.db, &auth.user_id).await?;

    let announcement = db::create_announcement(
        &state.db,
        CreateAnnouncement {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            content: request.content,
            category,
            priority,
            author_id: author.id,
            author_name: author.name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Update an announcement (admin only).
async fn update_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    if let Some(category) = &request.category {
        validate_category(category)?;
    }
    if let Some(priority) = &request.priority {
        validate_priority(priority)?;
    }

    let announcement = db::update_announcement(
        &state.db,
        &id,
        UpdateAnnouncement {
            title: request.title,
            content: request.content,
            category: request.category,
            priority: request.priority,
        },
    )
    .await?;

    Ok(Json(announcement))
}

/// Delete an announcement (admin only).
async fn delete_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    if !auth.is_admin() {
        return Err(Error::Forbidden);
    }

    db::delete_announcement(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "message": "Announcement deleted" })))
}
