use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

// ============================================================================
// Data Structures
// ============================================================================

/// Persisted session row. At most one session exists at a time.
#[derive(Debug, Clone, FromRow)]
pub struct StoredSession {
    pub email: String,
    pub token: String,
    pub created_at: i64,
}

/// Persisted chat message. `role` is either `user` or `api`.
#[derive(Debug, Clone, FromRow)]
pub struct StoredMessage {
    pub id: i64,
    pub role: String,
    pub text: String,
    pub created_at: i64,
}

// ============================================================================
// Database
// ============================================================================

/// Client-side persistence: the session token and the chat history, both
/// of which outlive a single process run.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    pub async fn open(path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        // Single-row session table; id is pinned to 1
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                email TEXT NOT NULL,
                token TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY,
                role TEXT NOT NULL CHECK (role IN ('user', 'api')),
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_created ON chat_messages(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Store the session, replacing any previous one.
    pub async fn save_session(&self, email: &str, token: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session (id, email, token, created_at)
            VALUES (1, ?, ?, strftime('%s', 'now'))
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                token = excluded.token,
                created_at = excluded.created_at
        "#,
        )
        .bind(email)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the stored session, if one exists.
    pub async fn load_session(&self) -> Result<Option<StoredSession>> {
        let session = sqlx::query_as::<_, StoredSession>(
            "SELECT email, token, created_at FROM session WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Delete the stored session.
    pub async fn clear_session(&self) -> Result<()> {
        sqlx::query("DELETE FROM session")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Chat History Operations
    // ========================================================================

    /// Append one chat message and return its row id.
    pub async fn append_message(&self, role: &str, text: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO chat_messages (role, text, created_at) VALUES (?, ?, strftime('%s', 'now'))",
        )
        .bind(role)
        .bind(text)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Full chat history in insertion order.
    pub async fn load_messages(&self) -> Result<Vec<StoredMessage>> {
        let messages = sqlx::query_as::<_, StoredMessage>(
            "SELECT id, role, text, created_at FROM chat_messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Delete the entire chat history. Returns the number of rows removed.
    pub async fn clear_messages(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_messages")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn session_roundtrip() {
        let db = test_db().await;
        assert!(db.load_session().await.unwrap().is_none());

        db.save_session("analyst@example.com", "tok-1")
            .await
            .unwrap();
        let session = db.load_session().await.unwrap().unwrap();
        assert_eq!(session.email, "analyst@example.com");
        assert_eq!(session.token, "tok-1");
    }

    #[tokio::test]
    async fn save_session_replaces_previous() {
        let db = test_db().await;
        db.save_session("a@example.com", "tok-a").await.unwrap();
        db.save_session("b@example.com", "tok-b").await.unwrap();

        let session = db.load_session().await.unwrap().unwrap();
        assert_eq!(session.email, "b@example.com");
        assert_eq!(session.token, "tok-b");
    }

    #[tokio::test]
    async fn clear_session_removes_row() {
        let db = test_db().await;
        db.save_session("a@example.com", "tok").await.unwrap();
        db.clear_session().await.unwrap();
        assert!(db.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_preserve_insertion_order() {
        let db = test_db().await;
        db.append_message("api", "greeting").await.unwrap();
        db.append_message("user", "question").await.unwrap();
        db.append_message("api", "answer").await.unwrap();

        let messages = db.load_messages().await.unwrap();
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["api", "user", "api"]);
        assert_eq!(messages[1].text, "question");
    }

    #[tokio::test]
    async fn invalid_role_rejected() {
        let db = test_db().await;
        assert!(db.append_message("bot", "nope").await.is_err());
    }

    #[tokio::test]
    async fn clear_messages_counts_rows() {
        let db = test_db().await;
        db.append_message("user", "one").await.unwrap();
        db.append_message("api", "two").await.unwrap();
        assert_eq!(db.clear_messages().await.unwrap(), 2);
        assert!(db.load_messages().await.unwrap().is_empty());
    }
}
