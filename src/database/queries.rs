use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::*;

const USAGE_COLUMNS: &str = "user_id, monthly_request_count, total_request_count, \
     reset_monthly_requests_date, tier, created_at, updated_at";

pub struct UsageQueries;

impl UsageQueries {
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UsageRecord>> {
        let record = sqlx::query_as::<_, UsageRecord>(&format!(
            "SELECT {} FROM phonetic_usage WHERE user_id = $1",
            USAGE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageRecord> {
        let record = sqlx::query_as::<_, UsageRecord>(&format!(
            r#"
            INSERT INTO phonetic_usage (user_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {}
            "#,
            USAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        record.ok_or_else(|| AppError::Conflict(format!("Usage record for {} already exists", user_id)))
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        update: &UsageUpdate,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let record = sqlx::query_as::<_, UsageRecord>(&format!(
            r#"
            UPDATE phonetic_usage
            SET monthly_request_count = COALESCE($2, monthly_request_count),
                reset_monthly_requests_date = COALESCE($3, reset_monthly_requests_date),
                tier = COALESCE($4, tier),
                updated_at = $5
            WHERE user_id = $1
            RETURNING {}
            "#,
            USAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(update.monthly_request_count)
        .bind(update.reset_date)
        .bind(update.tier)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        record.ok_or(AppError::NotFound)
    }

    /// Counts one billed request in a single statement, restarting the
    /// monthly counter when the request opens a new cycle.
    pub async fn increment(
        pool: &PgPool,
        user_id: Uuid,
        increment: &RequestIncrement,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let record = sqlx::query_as::<_, UsageRecord>(&format!(
            r#"
            UPDATE phonetic_usage
            SET monthly_request_count = CASE
                    WHEN $2::timestamptz IS NULL THEN monthly_request_count + 1
                    ELSE 1
                END,
                total_request_count = total_request_count + 1,
                reset_monthly_requests_date = COALESCE($2, reset_monthly_requests_date),
                tier = $3,
                updated_at = $4
            WHERE user_id = $1
            RETURNING {}
            "#,
            USAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(increment.new_cycle_reset_date)
        .bind(increment.tier)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        record.ok_or(AppError::NotFound)
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM phonetic_usage WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn ping(pool: &PgPool) -> Result<()> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
