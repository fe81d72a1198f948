//! Per-user conversation history.
//!
//! Wraps the conversations table with the seed-and-cap policy: an empty or
//! unreadable history yields the single system seed turn, and saves retain
//! only the seed plus the most recent turns so a long-lived conversation
//! cannot grow without bound.

use tracing::warn;

use crate::db::{self, DbPool, Turn, TurnRole};
use crate::Result;

/// Conversation history store with a retention cap.
#[derive(Clone)]
pub struct HistoryStore {
    db: DbPool,
    system_prompt: String,
    max_turns: usize,
}

impl HistoryStore {
    pub fn new(db: DbPool, system_prompt: String, max_turns: usize) -> Self {
        Self {
            db,
            system_prompt,
            max_turns,
        }
    }

    fn seed(&self) -> Vec<Turn> {
        vec![Turn::system(self.system_prompt.clone())]
    }

    /// Load the stored history, seeding a fresh one when no row exists or
    /// the store is unreachable.
    pub async fn load(&self, user_id: &str) -> Vec<Turn> {
        match db::get_conversation(&self.db, user_id).await {
            Ok(Some(turns)) if !turns.is_empty() => turns,
            Ok(_) => self.seed(),
            Err(e) => {
                warn!(error = %e, user_id, "History load failed, starting fresh");
                self.seed()
            }
        }
    }

    /// Persist the full history, applying the retention cap first.
    pub async fn save(&self, user_id: &str, turns: &[Turn]) -> Result<()> {
        let capped = self.apply_cap(turns);
        db::save_conversation(&self.db, user_id, &capped).await
    }

    /// Keep system turns plus the last `max_turns` non-system turns.
    fn apply_cap(&self, turns: &[Turn]) -> Vec<Turn> {
        let non_system = turns.iter().filter(|t| t.role != TurnRole::System).count();
        if non_system <= self.max_turns {
            return turns.to_vec();
        }

        let mut to_drop = non_system - self.max_turns;
        turns
            .iter()
            .filter(|t| {
                if t.role != TurnRole::System && to_drop > 0 {
                    to_drop -= 1;
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};

    async fn store(max_turns: usize) -> HistoryStore {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        HistoryStore::new(pool, "seed prompt".to_string(), max_turns)
    }

    #[tokio::test]
    async fn test_load_seeds_missing_history() {
        let store = store(10).await;

        let turns = store.load("new-user").await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::System);
        assert_eq!(turns[0].text, "seed prompt");
    }

    #[tokio::test]
    async fn test_save_load_roundtrip_under_cap() {
        let store = store(10).await;

        let turns = vec![
            Turn::system("seed prompt"),
            Turn::user("hello"),
            Turn::model("hi there"),
        ];
        store.save("user-1", &turns).await.unwrap();

        assert_eq!(store.load("user-1").await, turns);
    }

    #[tokio::test]
    async fn test_cap_drops_oldest_non_system_turns() {
        let store = store(2).await;

        let turns = vec![
            Turn::system("seed prompt"),
            Turn::user("one"),
            Turn::model("two"),
            Turn::user("three"),
            Turn::model("four"),
        ];
        store.save("user-1", &turns).await.unwrap();

        let loaded = store.load("user-1").await;
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].role, TurnRole::System);
        assert_eq!(loaded[1].text, "three");
        assert_eq!(loaded[2].text, "four");
    }
}
