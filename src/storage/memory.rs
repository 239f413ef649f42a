use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{RequestIncrement, UsageRecord, UsageUpdate},
    storage::UsageStore,
};

#[derive(Clone, Default)]
pub struct MemoryUsageStore {
    records: Arc<RwLock<HashMap<Uuid, UsageRecord>>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record as-is.
    pub async fn insert(&self, record: UsageRecord) {
        self.records.write().await.insert(record.user_id, record);
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn fetch_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>> {
        Ok(self.records.read().await.get(&user_id).cloned())
    }

    async fn create_usage(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&user_id) {
            return Err(AppError::Conflict(format!(
                "Usage record for {} already exists",
                user_id
            )));
        }

        let record = UsageRecord::new(user_id, now);
        records.insert(user_id, record.clone());
        Ok(record)
    }

    async fn update_usage(
        &self,
        user_id: Uuid,
        update: UsageUpdate,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&user_id).ok_or(AppError::NotFound)?;

        if let Some(count) = update.monthly_request_count {
            record.monthly_request_count = count;
        }
        if let Some(date) = update.reset_date {
            record.reset_monthly_requests_date = Some(date);
        }
        if let Some(tier) = update.tier {
            record.tier = tier;
        }
        record.updated_at = now;

        Ok(record.clone())
    }

    async fn record_request(
        &self,
        user_id: Uuid,
        increment: RequestIncrement,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&user_id).ok_or(AppError::NotFound)?;

        match increment.new_cycle_reset_date {
            Some(next_reset_date) => {
                record.monthly_request_count = 1;
                record.reset_monthly_requests_date = Some(next_reset_date);
            }
            None => record.monthly_request_count += 1,
        }
        record.total_request_count += 1;
        record.tier = increment.tier;
        record.updated_at = now;

        Ok(record.clone())
    }

    async fn delete_usage(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.records.write().await.remove(&user_id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
