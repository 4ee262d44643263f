use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::User;

/// Persistent user records for the OAuth backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the user for `external_id`, creating it on first sign-in.
    async fn upsert(&self, external_id: &str, email: &str) -> Result<User, AppError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert(&self, external_id: &str, email: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, email)
            VALUES ($1, $2)
            ON CONFLICT (external_id) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, external_id, email, tier, created_at
            "#,
        )
        .bind(external_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        info!("Signed in user {} ({})", user.id, user.tier);
        Ok(user)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn upsert(&self, external_id: &str, email: &str) -> Result<User, AppError> {
            let mut users = self.users.lock().await;
            let user = users
                .entry(external_id.to_string())
                .or_insert_with(|| User {
                    id: Uuid::new_v4(),
                    external_id: external_id.to_string(),
                    email: email.to_string(),
                    tier: "free".to_string(),
                    created_at: Utc::now(),
                });
            user.email = email.to_string();
            Ok(user.clone())
        }
    }

    #[tokio::test]
    async fn test_memory_upsert_is_stable() {
        let store = MemoryUserStore::default();
        let first = store.upsert("google-1", "a@x.io").await.unwrap();
        let second = store.upsert("google-1", "b@x.io").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "b@x.io");
    }
}
