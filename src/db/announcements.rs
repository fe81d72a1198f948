//! Announcement database queries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Announcement record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating an announcement.
#[derive(Debug, Clone)]
pub struct CreateAnnouncement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub author_id: String,
    pub author_name: String,
}

/// Input for updating an announcement.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnouncement {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Create a new announcement.
pub async fn create_announcement(pool: &DbPool, input: CreateAnnouncement) -> Result<Announcement> {
    sqlx::query_as::<_, Announcement>(
        r#"
        INSERT INTO announcements (id, title, content, category, priority, author_id, author_name)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.title)
    .bind(&input.content)
    .bind(&input.category)
    .bind(&input.priority)
    .bind(&input.author_id)
    .bind(&input.author_name)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get an announcement by ID.
pub async fn get_announcement(pool: &DbPool, id: &str) -> Result<Announcement> {
    sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Announcement not found: {}", id)))
}

/// List announcements, newest first, optionally filtered by category.
/// Uses idx_announcements_category / idx_announcements_created indexes.
pub async fn list_announcements(
    pool: &DbPool,
    category: Option<&str>,
) -> Result<Vec<Announcement>> {
    match category {
        Some(c) => sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements WHERE category = ? ORDER BY created_at DESC",
        )
        .bind(c)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
    }
}

/// Update an announcement.
pub async fn update_announcement(
    pool: &DbPool,
    id: &str,
    input: UpdateAnnouncement,
) -> Result<Announcement> {
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(title) = input.title {
        updates.push("title = ?");
        bindings.push(title);
    }
    if let Some(content) = input.content {
        updates.push("content = ?");
        bindings.push(content);
    }
    if let Some(category) = input.category {
        updates.push("category = ?");
        bindings.push(category);
    }
    if let Some(priority) = input.priority {
        updates.push("priority = ?");
        bindings.push(priority);
    }

    if updates.is_empty() {
        return get_announcement(pool, id).await;
    }

    updates.push("updated_at = datetime('now')");

    let query = format!(
        "UPDATE announcements SET {} WHERE id = ? RETURNING *",
        updates.join(", ")
    );

    let mut q = sqlx::query_as::<_, Announcement>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(id);

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Announcement not found: {}", id)))
}

/// Delete an announcement.
pub async fn delete_announcement(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Announcement not found: {}", id)));
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
                id: "admin-1".to_string(),
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: "hash".to_string(),
                student_id: "ADM001".to_string(),
                role: UserRole::Admin,
            },
        )
        .await
        .unwrap();
        pool
    }

    fn sample(id: &str, category: &str) -> CreateAnnouncement {
        CreateAnnouncement {
            id: id.to_string(),
            title: "Midterm schedule".to_string(),
            content: "Midterms start next Monday".to_string(),
            category: category.to_string(),
            priority: "high".to_string(),
            author_id: "admin-1".to_string(),
            author_name: "Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let pool = setup_test_db().await;

        create_announcement(&pool, sample("a-1", "academic"))
            .await
            .unwrap();
        create_announcement(&pool, sample("a-2", "event"))
            .await
            .unwrap();

        let all = list_announcements(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let academic = list_announcements(&pool, Some("academic")).await.unwrap();
        assert_eq!(academic.len(), 1);
        assert_eq!(academic[0].id, "a-1");

        let updated = update_announcement(
            &pool,
            "a-1",
            UpdateAnnouncement {
                priority: Some("low".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.priority, "low");

        delete_announcement(&pool, "a-1").await.unwrap();
        assert!(get_announcement(&pool, "a-1").await.is_err());
    }
}
