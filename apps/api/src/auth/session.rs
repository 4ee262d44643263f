//! Session storage for the OAuth flow: opaque session id → `UserIdentity`.
//!
//! Redis when `REDIS_URL` is configured, an in-process map otherwise.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::auth::UserIdentity;
use crate::errors::AppError;

const SESSION_KEY_PREFIX: &str = "session:";

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session_id: &str, user: &UserIdentity) -> Result<(), AppError>;
    async fn get(&self, session_id: &str) -> Result<Option<UserIdentity>, AppError>;
    async fn remove(&self, session_id: &str) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, (UserIdentity, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session_id: &str, user: &UserIdentity) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, (_, expires)| *expires > now);
        sessions.insert(session_id.to_string(), (user.clone(), now + self.ttl));
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<UserIdentity>, AppError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(user, _)| user.clone()))
    }

    async fn remove(&self, session_id: &str) -> Result<(), AppError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisSessionStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }
}

fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn insert(&self, session_id: &str, user: &UserIdentity) -> Result<(), AppError> {
        let payload = serde_json::to_string(user).map_err(|e| AppError::Internal(e.into()))?;
        let mut con = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(session_key(session_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut con)
            .await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<UserIdentity>, AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = con.get(session_key(session_id)).await?;
        Ok(payload.and_then(|p| serde_json::from_str(&p).ok()))
    }

    async fn remove(&self, session_id: &str) -> Result<(), AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(session_key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserIdentity {
        UserIdentity {
            id: "u-1".to_string(),
            username: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.insert("s1", &user()).await.unwrap();
        assert_eq!(store.get("s1").await.unwrap(), Some(user()));
        store.remove("s1").await.unwrap();
        assert_eq!(store.get("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expires() {
        let store = MemorySessionStore::new(Duration::from_millis(0));
        store.insert("s1", &user()).await.unwrap();
        assert_eq!(store.get("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[test]
    fn test_session_key_prefix() {
        assert_eq!(session_key("abc"), "session:abc");
    }
}
