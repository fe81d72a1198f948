//! Unauthenticated read-only mirrors consumed by the assistant service.
//!
//! The assistant fetches campus data over plain HTTP with no token, so these
//! routes expose the same queries as the authenticated endpoints but take the
//! target user as a query parameter and never return credential fields.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::{self, Announcement, LostFoundFilter, LostFoundItem, TimetableRow},
    error::Result,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct TimetableQuery {
    pub user_id: String,
    pub day: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LostFoundQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/timetables", get(timetables))
        .route("/announcements", get(announcements))
        .route("/lostfound", get(lostfound))
}

async fn timetables(
    State(state): State<AppState>,
    Query(query): Query<TimetableQuery>,
) -> Result<Json<Vec<TimetableRow>>> {
    let day = query.day.map(|d| d.to_lowercase());
    let rows = db::list_user_timetable(&state.db, &query.user_id, day.as_deref()).await?;
    Ok(Json(rows))
}

async fn announcements(
    State(state): State<AppState>,
    Query(query): Query<AnnouncementsQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let rows = db::list_announcements(&state.db, query.category.as_deref()).await?;
    Ok(Json(rows))
}

async fn lostfound(
    State(state): State<AppState>,
    Query(query): Query<LostFoundQuery>,
) -> Result<Json<Vec<LostFoundItem>>> {
    let items = db::list_lostfound_items(
        &state.db,
        LostFoundFilter {
            item_type: query.item_type,
            category: query.category,
            // The assistant only cares about unresolved items.
            status: Some("active".to_string()),
            search: query.search,
        },
    )
    .await?;
    Ok(Json(items))
}
