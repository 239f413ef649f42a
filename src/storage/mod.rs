use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::database::Database;
use crate::errors::Result;
use crate::models::{RequestIncrement, UsageRecord, UsageUpdate};

pub mod memory;
pub mod postgres;

/// Per-user usage records, keyed by user id. At most one record per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn fetch_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>>;

    async fn create_usage(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageRecord>;

    async fn update_usage(
        &self,
        user_id: Uuid,
        update: UsageUpdate,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord>;

    async fn record_request(
        &self,
        user_id: Uuid,
        increment: RequestIncrement,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord>;

    async fn delete_usage(&self, user_id: Uuid) -> Result<bool>;

    async fn health_check(&self) -> Result<()>;
}

pub async fn create_store(config: &Config) -> Result<Arc<dyn UsageStore>> {
    match config.usage_store {
        StoreBackend::Postgres => {
            let database = Database::new(&config.database_url).await?;
            database.migrate().await?;
            tracing::info!("Using Postgres usage store");
            Ok(Arc::new(postgres::PostgresUsageStore::new(database)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory usage store; records are lost on restart");
            Ok(Arc::new(memory::MemoryUsageStore::new()))
        }
    }
}
