//! Query history persistence.
//!
//! History is diagnostic, not correctness-critical: records are appended
//! after the answer has already been returned, and persistence failures are
//! swallowed by the scheduler.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::errors::ApiError;

/// Append-only sink for completed question/answer records.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn persist(
        &self,
        question: &str,
        answer: &str,
        tokens: Option<u32>,
        sources: &[String],
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub tokens: Option<i64>,
    pub sources: Vec<String>,
    pub created_at: String,
}

#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    pub async fn new(db_path: &Path) -> Result<Self, ApiError> {
        let connect_options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(connect_options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_db().await?;
        Ok(store)
    }

    async fn init_db(&self) -> Result<(), ApiError> {
        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS query_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                tokens INTEGER,
                sources TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_query_history_created_at \
             ON query_history(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, question, answer, tokens, sources, created_at \
             FROM query_history ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.into_iter()
            .map(|row| {
                let sources_json: String = row.get("sources");
                let sources =
                    serde_json::from_str(&sources_json).map_err(ApiError::internal)?;
                Ok(HistoryRecord {
                    id: row.get("id"),
                    question: row.get("question"),
                    answer: row.get("answer"),
                    tokens: row.get("tokens"),
                    sources,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

#[async_trait]
impl HistorySink for SqliteHistory {
    async fn persist(
        &self,
        question: &str,
        answer: &str,
        tokens: Option<u32>,
        sources: &[String],
    ) -> Result<(), ApiError> {
        let sources_json = serde_json::to_string(sources).map_err(ApiError::internal)?;
        sqlx::query(
            "INSERT INTO query_history (question, answer, tokens, sources) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(question)
        .bind(answer)
        .bind(tokens.map(|t| t as i64))
        .bind(sources_json)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;
        Ok(())
    }
}
