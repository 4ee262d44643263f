// Plan tracking: per-user upload quota, checked by the upload handler before analysis.

pub mod handlers;
pub mod quota;

pub use quota::{MemoryQuota, QuotaGate, RedisQuota};
