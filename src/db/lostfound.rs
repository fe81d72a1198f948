//! Lost & found database queries.
//!
//! Items are owned by the reporting user; ownership is the authorization
//! boundary for edits and deletes (admin override aside, which is checked
//! at the API layer).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Lost & found item record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LostFoundItem {
    pub id: String,
    pub user_id: String,
    pub item_type: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub status: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct CreateLostFoundItem {
    pub id: String,
    pub user_id: String,
    pub item_type: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image_url: Option<String>,
}

/// Input for updating an item.
#[derive(Debug, Clone, Default)]
pub struct UpdateLostFoundItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

/// Filters for item listings.
#[derive(Debug, Clone, Default)]
pub struct LostFoundFilter {
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Create a new item.
pub async fn create_lostfound_item(
    pool: &DbPool,
    input: CreateLostFoundItem,
) -> Result<LostFoundItem> {
    sqlx::query_as::<_, LostFoundItem>(
        r#"
        INSERT INTO lostfound_items
            (id, user_id, item_type, title, description, category, location, image_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.item_type)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.category)
    .bind(&input.location)
    .bind(&input.image_url)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get an item by ID.
pub async fn get_lostfound_item(pool: &DbPool, id: &str) -> Result<LostFoundItem> {
    sqlx::query_as::<_, LostFoundItem>("SELECT * FROM lostfound_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lost & found item not found: {}", id)))
}

/// List items, newest first, with optional filters.
pub async fn list_lostfound_items(
    pool: &DbPool,
    filter: LostFoundFilter,
) -> Result<Vec<LostFoundItem>> {
    let mut clauses = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(item_type) = filter.item_type {
        clauses.push("item_type = ?");
        bindings.push(item_type);
    }
    if let Some(category) = filter.category {
        clauses.push("category = ?");
        bindings.push(category);
    }
    if let Some(status) = filter.status {
        clauses.push("status = ?");
        bindings.push(status);
    }
    if let Some(search) = filter.search {
        clauses.push("(title LIKE ? OR description LIKE ?)");
        let pattern = format!("%{}%", search);
        bindings.push(pattern.clone());
        bindings.push(pattern);
    }

    let query = if clauses.is_empty() {
        "SELECT * FROM lostfound_items ORDER BY created_at DESC".to_string()
    } else {
        format!(
            "SELECT * FROM lostfound_items WHERE {} ORDER BY created_at DESC",
            clauses.join(" AND ")
        )
    };

    let mut q = sqlx::query_as::<_, LostFoundItem>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }

    q.fetch_all(pool).await.map_err(Error::Database)
}

/// Update an item's fields.
pub async fn update_lostfound_item(
    pool: &DbPool,
    id: &str,
    input: UpdateLostFoundItem,
) -> Result<LostFoundItem> {
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(title) = input.title {
        updates.push("title = ?");
        bindings.push(title);
    }
    if let Some(description) = input.description {
        updates.push("description = ?");
        bindings.push(description);
    }
    if let Some(category) = input.category {
        updates.push("category = ?");
        bindings.push(category);
    }
    if let Some(location) = input.location {
        updates.push("location = ?");
        bindings.push(location);
    }
    if let Some(image_url) = input.image_url {
        updates.push("image_url = ?");
        bindings.push(image_url);
    }

    if updates.is_empty() {
        return get_lostfound_item(pool, id).await;
    }

    updates.push("updated_at = datetime('now')");

    let query = format!(
        "UPDATE lostfound_items SET {} WHERE id = ? RETURNING *",
        updates.join(", ")
    );

    let mut q = sqlx::query_as::<_, LostFoundItem>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(id);

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lost & found item not found: {}", id)))
}

/// Transition an item's status (active -> resolved).
pub async fn update_lostfound_status(
    pool: &DbPool,
    id: &str,
    status: &str,
) -> Result<LostFoundItem> {
    sqlx::query_as::<_, LostFoundItem>(
        r#"
        UPDATE lostfound_items
        SET status = ?, updated_at = datetime('now')
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Lost & found item not found: {}", id)))
}

/// Delete an item.
pub async fn delete_lostfound_item(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM lostfound_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Lost & found item not found: {}",
            id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, init_pool, initialize_schema, CreateUser, UserRole};

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        create_user(
            &pool,
            CreateUser {
                id: "user-1".to_string(),
                name: "Owner".to_string(),
                email: "owner@example.com".to_string(),
                password_hash: "hash".to_string(),
                student_id: "STU001".to_string(),
                role: UserRole::Student,
            },
        )
        .await
        .unwrap();
        pool
    }

    fn sample(id: &str, item_type: &str, title: &str) -> CreateLostFoundItem {
        CreateLostFoundItem {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            item_type: item_type.to_string(),
            title: title.to_string(),
            description: "Left near the library".to_string(),
            category: "electronics".to_string(),
            location: "Library".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_filters() {
        let pool = setup_test_db().await;

        create_lostfound_item(&pool, sample("lf-1", "lost", "Black phone"))
            .await
            .unwrap();
        create_lostfound_item(&pool, sample("lf-2", "found", "Water bottle"))
            .await
            .unwrap();

        let lost = list_lostfound_items(
            &pool,
            LostFoundFilter {
                item_type: Some("lost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].id, "lf-1");

        let search = list_lostfound_items(
            &pool,
            LostFoundFilter {
                search: Some("phone".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(search.len(), 1);
    }

    #[tokio::test]
    async fn test_status_transition() {
        let pool = setup_test_db().await;
        create_lostfound_item(&pool, sample("lf-1", "lost", "Calculator"))
            .await
            .unwrap();

        let item = update_lostfound_status(&pool, "lf-1", "resolved")
            .await
            .unwrap();
        assert_eq!(item.status, "resolved");
    }
}
