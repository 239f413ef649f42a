use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{RequestIncrement, Tier, TierLimits, UsageRecord, UsageSummary, UsageUpdate},
    services::{
        entitlement::EntitlementProvider,
        metrics::MetricsService,
        renewal::{next_renewal_date, one_month_after},
        usage_reset::{ResetDecision, ResetOptions, UsageResetEvaluator},
    },
    storage::UsageStore,
};

/// Credit bookkeeping around billed requests: screen-load refresh, the
/// pre-request gate, the post-request increment and paywall purchases.
#[derive(Clone)]
pub struct QuotaManager {
    store: Arc<dyn UsageStore>,
    entitlements: Arc<dyn EntitlementProvider>,
    evaluator: UsageResetEvaluator,
    limits: TierLimits,
    metrics: Arc<MetricsService>,
}

impl QuotaManager {
    pub fn new(
        store: Arc<dyn UsageStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        limits: TierLimits,
        metrics: Arc<MetricsService>,
    ) -> Self {
        let evaluator = UsageResetEvaluator::new(store.clone(), entitlements.clone(), metrics.clone());

        Self {
            store,
            entitlements,
            evaluator,
            limits,
            metrics,
        }
    }

    pub async fn provision(&self, user_id: Uuid) -> Result<UsageRecord> {
        let record = self.store.create_usage(user_id, Utc::now()).await?;
        tracing::info!(%user_id, "Provisioned usage record");
        Ok(record)
    }

    pub async fn remove(&self, user_id: Uuid) -> Result<()> {
        if !self.store.delete_usage(user_id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(%user_id, "Deleted usage record");
        Ok(())
    }

    pub async fn usage_summary(&self, user_id: Uuid) -> Result<UsageSummary> {
        self.usage_summary_at(user_id, Utc::now()).await
    }

    pub async fn usage_summary_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageSummary> {
        // Refresh the stored cycle before reading it back
        let pending_reset = match self
            .evaluator
            .evaluate_at(user_id, ResetOptions::on_mount(), now)
            .await
        {
            Ok(_) => None,
            Err(err) => match err.pending_reset() {
                Some(next_reset_date) => {
                    tracing::warn!(%user_id, error = %err, "Showing a reset cycle that was not persisted");
                    Some(next_reset_date)
                }
                None => return Err(err),
            },
        };

        let record = self
            .store
            .fetch_usage(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let (monthly_request_count, reset_date) = match pending_reset {
            Some(next_reset_date) => (0, Some(next_reset_date)),
            None => (record.monthly_request_count, record.reset_monthly_requests_date),
        };

        let tier = self.entitlements.subscription_status(user_id).await?.tier();
        let limit = self.limits.limit_for(tier);

        Ok(UsageSummary {
            monthly_request_count,
            total_request_count: record.total_request_count,
            reset_date,
            tier,
            limit,
            remaining: remaining(limit, monthly_request_count),
        })
    }

    pub async fn check_request(&self, user_id: Uuid) -> Result<QuotaCheck> {
        self.check_request_at(user_id, Utc::now()).await
    }

    pub async fn check_request_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<QuotaCheck> {
        let (check, _) = self.gate_at(user_id, now).await?;
        Ok(check)
    }

    async fn gate_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(QuotaCheck, Tier)> {
        let decision = self
            .evaluator
            .evaluate_at(user_id, ResetOptions::before_request(), now)
            .await?;

        let subscription = self.entitlements.subscription_status(user_id).await?;
        let tier = subscription.tier();
        let limit = self.limits.limit_for(tier);

        // A request that opens a new cycle starts from an empty counter
        let used = match decision {
            ResetDecision::ResetApplied(_) => 0,
            ResetDecision::NoResetNeeded => self
                .store
                .fetch_usage(user_id)
                .await?
                .ok_or(AppError::NotFound)?
                .monthly_request_count,
        };

        if used >= i64::from(limit) {
            self.metrics.record_quota_denial(tier);
            tracing::info!(%user_id, used, limit, tier = tier.as_str(), "Monthly quota reached");

            let check = match tier {
                Tier::Basic => QuotaCheck::LimitReached {
                    used,
                    limit,
                    resets_at: subscription.expires_at,
                },
                Tier::Free => QuotaCheck::UpgradeRequired { used, limit },
            };
            return Ok((check, tier));
        }

        Ok((QuotaCheck::Allowed { decision, used, limit }, tier))
    }

    pub async fn record_request(&self, user_id: Uuid, claimed: ResetDecision) -> Result<UsageRecord> {
        self.record_request_at(user_id, claimed, Utc::now()).await
    }

    /// Counts one billed request against the cycle as evaluated now.
    ///
    /// `claimed` is the decision the caller got from the gate. It cannot open
    /// a cycle the store does not consider over. When a cycle is due, the date
    /// computed here wins over the claimed one.
    pub async fn record_request_at(
        &self,
        user_id: Uuid,
        claimed: ResetDecision,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let (check, tier) = self.gate_at(user_id, now).await?;

        let decision = match check {
            QuotaCheck::Allowed { decision, .. } => decision,
            QuotaCheck::LimitReached { used, limit, .. } | QuotaCheck::UpgradeRequired { used, limit } => {
                return Err(AppError::QuotaExceeded(format!(
                    "Monthly quota of {} requests reached ({} used)",
                    limit, used
                )));
            }
        };

        if let (ResetDecision::ResetApplied(_), ResetDecision::NoResetNeeded) = (claimed, decision) {
            tracing::warn!(%user_id, ?claimed, "Rejected new cycle claim during a live cycle");
            return Err(AppError::Validation(
                "The current usage cycle has not ended".to_string(),
            ));
        }

        let increment = RequestIncrement {
            new_cycle_reset_date: decision.next_reset_date(),
            tier,
        };

        let record = self.store.record_request(user_id, increment, now).await?;
        self.metrics.record_billed_request(tier);

        tracing::debug!(
            %user_id,
            monthly = record.monthly_request_count,
            total = record.total_request_count,
            "Recorded billed request"
        );
        Ok(record)
    }

    /// Moves the user onto the paid tier with a fresh cycle.
    pub async fn apply_purchase(&self, user_id: Uuid) -> Result<UsageRecord> {
        self.apply_purchase_at(user_id, Utc::now()).await
    }

    pub async fn apply_purchase_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<UsageRecord> {
        let subscription = self.entitlements.subscription_status(user_id).await?;
        if !subscription.is_active {
            return Err(AppError::Validation(
                "No active subscription for this user".to_string(),
            ));
        }

        let reset_date = subscription
            .expires_at
            .or_else(|| {
                subscription
                    .billing_anchor()
                    .and_then(|anchor| next_renewal_date(anchor, now))
            })
            .or_else(|| one_month_after(now))
            .ok_or_else(|| AppError::Validation("Reset date is out of range".to_string()))?;

        let update = UsageUpdate {
            tier: Some(Tier::Basic),
            ..UsageUpdate::reset(reset_date)
        };

        let record = self.store.update_usage(user_id, update, now).await?;
        self.metrics.record_purchase();

        tracing::info!(%user_id, %reset_date, "Applied subscription purchase");
        Ok(record)
    }
}

fn remaining(limit: u32, used: i64) -> u32 {
    u32::try_from(i64::from(limit) - used).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuotaCheck {
    Allowed {
        decision: ResetDecision,
        used: i64,
        limit: u32,
    },
    /// Paid users wait for their next cycle.
    LimitReached {
        used: i64,
        limit: u32,
        resets_at: Option<DateTime<Utc>>,
    },
    /// Free users need to subscribe to continue.
    UpgradeRequired { used: i64, limit: u32 },
}

impl QuotaCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaCheck::Allowed { .. })
    }
}
