//! Lost & found endpoints.
//!
//! Listings are public. Posting requires a logged-in user; editing, resolving,
//! and deleting an item is limited to its owner or an admin.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, CreateLostFoundItem, LostFoundFilter, LostFoundItem, UpdateLostFoundItem},
    error::{Error, Result},
    middleware::{require_auth, AuthUser},
    AppState,
};

const ITEM_TYPES: &[&str] = &["lost", "found"];
const CATEGORIES: &[&str] = &[
    "electronics",
    "books",
    "clothing",
    "accessories",
    "documents",
    "other",
];
const STATUSES: &[&str] = &["active", "resolved"];

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub location: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_items))
        .route("/:id", get(get_item));

    let protected = Router::new()
        .route("/", post(create_item))
        .route("/:id", put(update_item).delete(delete_item))
        .route("/:id/status", patch(update_status))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

fn check_owner_or_admin(item: &LostFoundItem, auth: &AuthUser) -> Result<()> {
    if item.user_id != auth.user_id && !auth.is_admin() {
        return Err(Error::Forbidden);
    }
    Ok(())
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LostFoundItem>>> {
    let items = db::list_lostfound_items(
        &state.db,
        LostFoundFilter {
            item_type: query.item_type,
            category: query.category,
            status: query.status,
            search: query.search,
        },
    )
    .await?;
    Ok(Json(items))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LostFoundItem>> {
    let item = db::get_lostfound_item(&state.db, &id).await?;
    Ok(Json(item))
}

/// Post a new lost or found item.
async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateItemRequest>,
) -> Result<impl IntoResponse> {
    if !ITEM_TYPES.contains(&request.item_type.as_str()) {
        return Err(Error::Validation(
            "Type must be 'lost' or 'found'".to_string(),
        ));
    }
    if request.title.trim().is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    if request.location.trim().is_empty() {
        return Err(Error::Validation("Location is required".to_string()));
    }

    let category = request.category.unwrap_or_else(|| "other".to_string());
    if !CATEGORIES.contains(&category.as_str()) {
        return Err(Error::Validation(format!(
            "Category must be one of: {}",
            CATEGORIES.join(", ")
        )));
    }

    let item = db::create_lostfound_item(
        &state.db,
        CreateLostFoundItem {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: auth.user_id.clone(),
            item_type: request.item_type,
            title: request.title.trim().to_string(),
            description: request.description,
            category,
            location: request.location,
            image_url: request.image_url,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item (owner or admin).
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<LostFoundItem>> {
    let existing = db::get_lostfound_item(&state.db, &id).await?;
    check_owner_or_admin(&existing, &auth)?;

    if let Some(category) = &request.category {
        if !CATEGORIES.contains(&category.as_str()) {
            return Err(Error::Validation(format!(
                "Category must be one of: {}",
                CATEGORIES.join(", ")
            )));
        }
    }

    let item = db::update_lostfound_item(
        &state.db,
        &id,
        UpdateLostFoundItem {
            title: request.title,
            description: request.description,
            category: request.category,
            location: request.location,
            image_url: request.image_url,
        },
    )
    .await?;

    Ok(Json(item))
}

/// Mark an item resolved (or active again). Owner or admin.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<LostFoundItem>> {
    if !STATUSES.contains(&request.status.as_str()) {
        return Err(Error::Validation(
            "Status must be 'active' or 'resolved'".to_string(),
        ));
    }

    let existing = db::get_lostfound_item(&state.db, &id).await?;
    check_owner_or_admin(&existing, &auth)?;

    let item = db::update_lostfound_status(&state.db, &id, &request.status).await?;
    Ok(Json(item))
}

/// Delete an item (owner or admin).
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let existing = db::get_lostfound_item(&state.db, &id).await?;
    check_owner_or_admin(&existing, &auth)?;

    db::delete_lostfound_item(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "message": "Item deleted" })))
}
