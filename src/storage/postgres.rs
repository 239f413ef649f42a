use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    database::{queries::UsageQueries, Database},
    errors::Result,
    models::{RequestIncrement, UsageRecord, UsageUpdate},
    storage::UsageStore,
};

pub struct PostgresUsageStore {
    database: Database,
}

impl PostgresUsageStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl UsageStore for PostgresUsageStore {
    async fn fetch_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>> {
        UsageQueries::find_by_user(self.database.pool(), user_id).await
    }

    async fn create_usage(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageRecord> {
        UsageQueries::create(self.database.pool(), user_id, now).await
    }

    async fn update_usage(
        &self,
        user_id: Uuid,
        update: UsageUpdate,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        UsageQueries::update(self.database.pool(), user_id, &update, now).await
    }

    async fn record_request(
        &self,
        user_id: Uuid,
        increment: RequestIncrement,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        UsageQueries::increment(self.database.pool(), user_id, &increment, now).await
    }

    async fn delete_usage(&self, user_id: Uuid) -> Result<bool> {
        UsageQueries::delete(self.database.pool(), user_id).await
    }

    async fn health_check(&self) -> Result<()> {
        UsageQueries::ping(self.database.pool()).await
    }
}
