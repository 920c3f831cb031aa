//! Session store.
//!
//! Sessions persist as JSON blobs keyed by session id; expired rows are
//! ignored on load and purged opportunistically.

use super::{current_timestamp, Database};
use crate::error::AppError;
use bolster_auth::{SessionData, SessionId};

impl Database {
    /// Load session data if present and unexpired.
    pub async fn load_session(&self, id: &SessionId) -> Result<Option<SessionData>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM sessions WHERE id = ? AND expires_at > ?")
                .bind(id.as_str())
                .bind(current_timestamp())
                .fetch_optional(self.pool())
                .await?;

        match row {
            Some((data,)) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("corrupt session: {e}"))),
            None => Ok(None),
        }
    }

    /// Persist session data.
    pub async fn save_session(&self, id: &SessionId, data: &SessionData) -> Result<(), AppError> {
        let json = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("serialize session: {e}")))?;
        sqlx::query("INSERT OR REPLACE INTO sessions (id, data, expires_at) VALUES (?, ?, ?)")
            .bind(id.as_str())
            .bind(json)
            .bind(data.expires_at)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Delete a session.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.as_str())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Drop expired sessions.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(current_timestamp())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_roundtrip() {
        let db = Database::in_memory().await;
        let id = SessionId::generate();
        let mut data = SessionData::new();
        data.flash(bolster_auth::FlashKind::Success, "hello");

        db.save_session(&id, &data).await.unwrap();
        let loaded = db.load_session(&id).await.unwrap().unwrap();
        assert_eq!(loaded.csrf_token, data.csrf_token);
        assert_eq!(loaded.flash.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_not_loaded() {
        let db = Database::in_memory().await;
        let id = SessionId::generate();
        let mut data = SessionData::new();
        data.expires_at = 1;

        db.save_session(&id, &data).await.unwrap();
        assert!(db.load_session(&id).await.unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let db = Database::in_memory().await;
        let id = SessionId::generate();
        db.save_session(&id, &SessionData::new()).await.unwrap();
        db.delete_session(&id).await.unwrap();
        assert!(db.load_session(&id).await.unwrap().is_none());
    }
}
