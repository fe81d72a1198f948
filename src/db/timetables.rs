//! Timetable enrollment queries.
//!
//! An enrollment links a user to a class. The (user_id, class_id) pair is
//! unique; the second insert of the same pair is rejected by the store.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Enrollment record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: String,
    pub user_id: String,
    pub class_id: String,
    pub created_at: String,
}

/// Enroll a user in a class.
pub async fn create_timetable_entry(
    pool: &DbPool,
    id: &str,
    user_id: &str,
    class_id: &str,
) -> Result<TimetableEntry> {
    sqlx::query_as::<_, TimetableEntry>(
        r#"
        INSERT INTO timetable_entries (id, user_id, class_id)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(class_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Already enrolled in class {}", class_id))
        }
        _ => Error::Database(e),
    })
}

/// Get an enrollment by ID.
pub async fn get_timetable_entry(pool: &DbPool, id: &str) -> Result<TimetableEntry> {
    sqlx::query_as::<_, TimetableEntry>("SELECT * FROM timetable_entries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Enrollment not found: {}", id)))
}

/// List a user's enrollments.
/// Uses idx_timetable_user index.
pub async fn list_timetable_entries(pool: &DbPool, user_id: &str) -> Result<Vec<TimetableEntry>> {
    sqlx::query_as::<_, TimetableEntry>(
        "SELECT * FROM timetable_entries WHERE user_id = ? ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Remove an enrollment.
pub async fn delete_timetable_entry(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM timetable_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Enrollment not found: {}", id)));
    }

    Ok(())
}
