//! Conversation history queries.
//!
//! One row per user. The full turn array is serialized as JSON and
//! overwritten on every save (last write wins under concurrent saves).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Model,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, FromRow)]
struct ConversationRow {
    turns: String,
}

/// Load the stored turns for a user, or None when no row exists.
pub async fn get_conversation(pool: &DbPool, user_id: &str) -> Result<Option<Vec<Turn>>> {
    let row: Option<ConversationRow> =
        sqlx::query_as("SELECT turns FROM conversations WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some(row) => {
            let turns: Vec<Turn> = serde_json::from_str(&row.turns)
                .map_err(|e| Error::Internal(format!("Corrupt conversation row: {}", e)))?;
            Ok(Some(turns))
        }
        None => Ok(None),
    }
}

/// Upsert the full turn array for a user, stamping the update time.
pub async fn save_conversation(pool: &DbPool, user_id: &str, turns: &[Turn]) -> Result<()> {
    let json = serde_json::to_string(turns)
        .map_err(|e| Error::Internal(format!("Failed to serialize turns: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO conversations (user_id, turns, updated_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(user_id) DO UPDATE SET
            turns = excluded.turns,
            updated_at = datetime('now')
        "#,
    )
    .bind(user_id)
    .bind(&json)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let pool = setup_test_db().await;

        let turns = vec![
            Turn::system("You are the campus assistant."),
            Turn::user("When is my next class?"),
            Turn::model("Your next class is at 9am."),
        ];

        save_conversation(&pool, "user-1", &turns).await.unwrap();
        let loaded = get_conversation(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(loaded, turns);
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_array() {
        let pool = setup_test_db().await;

        save_conversation(&pool, "user-1", &[Turn::user("first")])
            .await
            .unwrap();
        save_conversation(&pool, "user-1", &[Turn::user("second")])
            .await
            .unwrap();

        let loaded = get_conversation(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "second");
    }

    #[tokio::test]
    async fn test_missing_row_is_none() {
        let pool = setup_test_db().await;
        assert!(get_conversation(&pool, "ghost").await.unwrap().is_none());
    }
}
