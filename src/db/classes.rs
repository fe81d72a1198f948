//! Class and class-timing database queries.
//!
//! A class owns zero or more timings (day, start/end, instructor).
//! Deleting a class does not cascade to its timings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Class record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub semester: String,
    pub created_at: String,
}

/// Class timing record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClassTiming {
    pub id: String,
    pub class_id: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
    pub created_at: String,
}

/// Input for creating a class.
#[derive(Debug, Clone)]
pub struct CreateClass {
    pub id: String,
    pub name: String,
    pub semester: String,
}

/// Input for creating a class timing.
#[derive(Debug, Clone)]
pub struct CreateClassTiming {
    pub id: String,
    pub class_id: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
}

/// Create a new class.
pub async fn create_class(pool: &DbPool, input: CreateClass) -> Result<Class> {
    sqlx::query_as::<_, Class>(
        r#"
        INSERT INTO classes (id, name, semester)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.name)
    .bind(&input.semester)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a class by ID.
pub async fn get_class(pool: &DbPool, id: &str) -> Result<Class> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Class not found: {}", id)))
}

/// List all classes.
pub async fn list_classes(pool: &DbPool) -> Result<Vec<Class>> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Delete a class. Timings are intentionally left in place.
pub async fn delete_class(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Class not found: {}", id)));
    }

    Ok(())
}

/// Add a timing to a class.
pub async fn create_class_timing(pool: &DbPool, input: CreateClassTiming) -> Result<ClassTiming> {
    sqlx::query_as::<_, ClassTiming>(
        r#"
        INSERT INTO class_timings (id, class_id, day, start_time, end_time, instructor)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.class_id)
    .bind(&input.day)
    .bind(&input.start_time)
    .bind(&input.end_time)
    .bind(&input.instructor)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List timings for a class.
/// Uses idx_class_timings_class index.
pub async fn list_class_timings(pool: &DbPool, class_id: &str) -> Result<Vec<ClassTiming>> {
    sqlx::query_as::<_, ClassTiming>(
        "SELECT * FROM class_timings WHERE class_id = ? ORDER BY day, start_time",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Delete a class timing.
pub async fn delete_class_timing(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM class_timings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Class timing not found: {}", id)));
    }

    Ok(())
}

/// A user's timetable row: one enrolled class joined to one of its timings,
/// optionally filtered by day. Feeds the assistant's timetable context.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TimetableRow {
    pub class_name: String,
    pub semester: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
}

/// List timetable rows for a user (enrolled classes with their timings).
pub async fn list_user_timetable(
    pool: &DbPool,
    user_id: &str,
    day: Option<&str>,
) -> Result<Vec<TimetableRow>> {
    let base = r#"
        SELECT c.name AS class_name, c.semester, t.day, t.start_time, t.end_time, t.instructor
        FROM timetable_entries e
        JOIN classes c ON c.id = e.class_id
        JOIN class_timings t ON t.class_id = c.id
        WHERE e.user_id = ?
    "#;

    match day {
        Some(d) => sqlx::query_as::<_, TimetableRow>(&format!(
            "{} AND t.day = ? ORDER BY t.start_time",
            base
        ))
        .bind(user_id)
        .bind(d)
        .fetch_all(pool)
        .await
        .map_err(Error::Database),
        None => sqlx::query_as::<_, TimetableRow>(&format!("{} ORDER BY t.day, t.start_time", base))
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(Error::Database),
    }
}
