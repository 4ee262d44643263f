//! Upload quota: how many resumes a user may analyse on their plan.
//!
//! The upload handler reserves a slot with `reserve_upload` before reading the file
//! and hands it back with `release_upload` if the analysis fails. Check and increment
//! happen in one step, so concurrent uploads cannot overshoot the limit. The engine
//! never sees this.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::errors::AppError;

pub const FREE_TIER: &str = "free";
const QUOTA_KEY_PREFIX: &str = "quota:uploads:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanUsage {
    pub tier: String,
    pub used: u32,
    pub limit: u32,
}

impl PlanUsage {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// Carried in `AppState` as `Arc<dyn QuotaGate>`.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    async fn usage(&self, user_id: &str) -> Result<PlanUsage, AppError>;

    /// Atomically claims one upload. `None` when the plan is already used up.
    async fn reserve_upload(&self, user_id: &str) -> Result<Option<PlanUsage>, AppError>;

    /// Returns a slot claimed by `reserve_upload` for an upload that was not analysed.
    async fn release_upload(&self, user_id: &str) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

pub struct MemoryQuota {
    limit: u32,
    used: Mutex<HashMap<String, u32>>,
}

impl MemoryQuota {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: Mutex::new(HashMap::new()),
        }
    }

    fn usage_of(&self, used: u32) -> PlanUsage {
        PlanUsage {
            tier: FREE_TIER.to_string(),
            used,
            limit: self.limit,
        }
    }
}

#[async_trait]
impl QuotaGate for MemoryQuota {
    async fn usage(&self, user_id: &str) -> Result<PlanUsage, AppError> {
        let used = self.used.lock().await.get(user_id).copied().unwrap_or(0);
        Ok(self.usage_of(used))
    }

    async fn reserve_upload(&self, user_id: &str) -> Result<Option<PlanUsage>, AppError> {
        let mut map = self.used.lock().await;
        let used = map.entry(user_id.to_string()).or_insert(0);
        if *used >= self.limit {
            return Ok(None);
        }
        *used += 1;
        Ok(Some(self.usage_of(*used)))
    }

    async fn release_upload(&self, user_id: &str) -> Result<(), AppError> {
        if let Some(used) = self.used.lock().await.get_mut(user_id) {
            *used = used.saturating_sub(1);
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisQuota {
    client: redis::Client,
    limit: u32,
}

impl RedisQuota {
    pub fn new(client: redis::Client, limit: u32) -> Self {
        Self { client, limit }
    }
}

fn quota_key(user_id: &str) -> String {
    format!("{QUOTA_KEY_PREFIX}{user_id}")
}

#[async_trait]
impl QuotaGate for RedisQuota {
    async fn usage(&self, user_id: &str) -> Result<PlanUsage, AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let used: Option<u32> = con.get(quota_key(user_id)).await?;
        Ok(PlanUsage {
            tier: FREE_TIER.to_string(),
            used: used.unwrap_or(0),
            limit: self.limit,
        })
    }

    async fn reserve_upload(&self, user_id: &str) -> Result<Option<PlanUsage>, AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let key = quota_key(user_id);
        let used: i64 = con.incr(&key, 1).await?;
        if used > i64::from(self.limit) {
            con.decr::<_, _, ()>(&key, 1).await?;
            return Ok(None);
        }
        Ok(Some(PlanUsage {
            tier: FREE_TIER.to_string(),
            used: used.try_into().unwrap_or(self.limit),
            limit: self.limit,
        }))
    }

    async fn release_upload(&self, user_id: &str) -> Result<(), AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let key = quota_key(user_id);
        let used: i64 = con.decr(&key, 1).await?;
        if used < 0 {
            con.set::<_, _, ()>(&key, 0).await?;
        }
        Ok(())
    }
}
