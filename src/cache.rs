//! Answer caching over Redis.
//!
//! The cache is best-effort: every failure here is logged by the caller and
//! the request proceeds without caching.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::ApiError;

/// Serialized answer bundle stored under a cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub answer: String,
    pub sources: Vec<String>,
    pub tokens: Option<u32>,
    pub time_ms: f64,
}

/// Key-value cache with TTL expiry.
#[async_trait]
pub trait AnswerCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), ApiError>;

    async fn delete(&self, key: &str) -> Result<(), ApiError>;
}

/// Deterministic cache key: `<prefix>:<collection>:<first 8 hex chars of
/// sha256(question)>`.
pub fn cache_key(prefix: &str, collection: &str, question: &str) -> String {
    let digest = Sha256::digest(question.as_bytes());
    let hash = hex::encode(digest);
    format!("{}:{}:{}", prefix, collection, &hash[..8])
}

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects eagerly; an unreachable Redis surfaces here so startup can
    /// degrade to cacheless operation instead of failing requests later.
    pub async fn connect(url: &str) -> Result<Self, ApiError> {
        let client = redis::Client::open(url).map_err(ApiError::internal)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(ApiError::internal)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl AnswerCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(ApiError::internal)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(ApiError::internal)
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(ApiError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_deterministic() {
        let a = cache_key("ask", "default", "What is X?");
        let b = cache_key("ask", "default", "What is X?");
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_has_prefix_collection_and_short_hash() {
        let key = cache_key("ask", "docs", "What is X?");
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts[0], "ask");
        assert_eq!(parts[1], "docs");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_questions_get_different_keys() {
        assert_ne!(
            cache_key("ask", "default", "What is X?"),
            cache_key("ask", "default", "What is Y?")
        );
    }

    #[test]
    fn cached_answer_round_trips_through_json() {
        let bundle = CachedAnswer {
            answer: "42".to_string(),
            sources: vec!["a.txt".to_string(), "b.txt".to_string()],
            tokens: Some(10),
            time_ms: 12.5,
        };
        let json = serde_json::to_string(&bundle).unwrap();
        let back: CachedAnswer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }
}
