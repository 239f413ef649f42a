use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::UsageUpdate,
    services::{
        entitlement::EntitlementProvider,
        metrics::MetricsService,
        renewal::{is_expired, next_renewal_date, one_month_after},
    },
    storage::UsageStore,
};

/// Outcome of a reset evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "next_reset_date", rename_all = "snake_case")]
pub enum ResetDecision {
    NoResetNeeded,
    /// The current request opens a new cycle ending at the given date.
    ResetApplied(DateTime<Utc>),
}

impl ResetDecision {
    pub fn next_reset_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ResetDecision::NoResetNeeded => None,
            ResetDecision::ResetApplied(date) => Some(*date),
        }
    }
}

impl From<Option<DateTime<Utc>>> for ResetDecision {
    fn from(date: Option<DateTime<Utc>>) -> Self {
        date.map_or(ResetDecision::NoResetNeeded, ResetDecision::ResetApplied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOptions {
    /// Called while loading a screen rather than right before a billed request.
    pub on_mount: bool,
    /// Write the recomputed cycle back to the usage store.
    pub persist: bool,
}

impl ResetOptions {
    pub fn on_mount() -> Self {
        Self { on_mount: true, persist: true }
    }

    pub fn before_request() -> Self {
        Self { on_mount: false, persist: false }
    }
}

#[derive(Clone)]
pub struct UsageResetEvaluator {
    store: Arc<dyn UsageStore>,
    entitlements: Arc<dyn EntitlementProvider>,
    metrics: Arc<MetricsService>,
}

impl UsageResetEvaluator {
    pub fn new(
        store: Arc<dyn UsageStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self { store, entitlements, metrics }
    }

    pub async fn evaluate(&self, user_id: Uuid, options: ResetOptions) -> Result<ResetDecision> {
        self.evaluate_at(user_id, options, Utc::now()).await
    }

    pub async fn evaluate_at(
        &self,
        user_id: Uuid,
        options: ResetOptions,
        now: DateTime<Utc>,
    ) -> Result<ResetDecision> {
        let record = self
            .store
            .fetch_usage(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let stored_reset_date = record.reset_monthly_requests_date;
        let expired = stored_reset_date.map_or(false, |date| is_expired(date, now));

        let reset_due = if options.on_mount {
            expired
        } else {
            expired || stored_reset_date.is_none()
        };

        if !reset_due {
            return Ok(ResetDecision::NoResetNeeded);
        }

        let next_reset_date = self.next_reset_date(user_id, stored_reset_date, now).await?;
        tracing::info!(
            %user_id,
            %next_reset_date,
            on_mount = options.on_mount,
            persist = options.persist,
            "Monthly usage reset due"
        );

        if options.persist {
            let trigger = if options.on_mount { "mount" } else { "request" };
            match self
                .store
                .update_usage(user_id, UsageUpdate::reset(next_reset_date), now)
                .await
            {
                Ok(_) => self.metrics.record_reset(trigger),
                Err(e) => {
                    tracing::error!(%user_id, "Failed to persist usage reset: {}", e);
                    self.metrics.record_error("reset_not_persisted");
                    return Err(AppError::ResetNotPersisted {
                        next_reset_date,
                        source: Box::new(e),
                    });
                }
            }
        }

        // A mount-time reset is visible to the next read, so callers have nothing to adjust
        if options.on_mount {
            Ok(ResetDecision::NoResetNeeded)
        } else {
            Ok(ResetDecision::ResetApplied(next_reset_date))
        }
    }

    /// Active subscribers follow their billing cycle; everyone else follows
    /// the stored reset date.
    async fn next_reset_date(
        &self,
        user_id: Uuid,
        stored_reset_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let subscription = self.entitlements.subscription_status(user_id).await?;

        let anchor = if subscription.is_active {
            subscription.billing_anchor()
        } else {
            stored_reset_date
        };

        let next = match anchor {
            Some(anchor) => next_renewal_date(anchor, now),
            None => one_month_after(now),
        };

        next.ok_or_else(|| AppError::Validation("Reset date is out of range".to_string()))
    }
}
