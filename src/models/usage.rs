use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "usage_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Basic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
        }
    }
}

/// Monthly request ceilings per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub free: u32,
    pub basic: u32,
}

impl TierLimits {
    pub fn limit_for(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.free,
            Tier::Basic => self.basic,
        }
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self { free: 10, basic: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub monthly_request_count: i64,
    pub total_request_count: i64,
    pub reset_monthly_requests_date: Option<DateTime<Utc>>,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Fresh record as created at account provisioning.
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            monthly_request_count: 0,
            total_request_count: 0,
            reset_monthly_requests_date: None,
            tier: Tier::Free,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a usage record. `None` fields are left untouched;
/// `updated_at` is always written. The lifetime counter only moves through
/// `RequestIncrement`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageUpdate {
    pub monthly_request_count: Option<i64>,
    pub reset_date: Option<DateTime<Utc>>,
    pub tier: Option<Tier>,
}

impl UsageUpdate {
    /// Rolls the monthly counter over to a new cycle ending at `next_reset_date`.
    pub fn reset(next_reset_date: DateTime<Utc>) -> Self {
        Self {
            monthly_request_count: Some(0),
            reset_date: Some(next_reset_date),
            ..Default::default()
        }
    }
}

/// One billed request. When `new_cycle_reset_date` is set the request is the
/// first of a new cycle and the monthly counter restarts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestIncrement {
    pub new_cycle_reset_date: Option<DateTime<Utc>>,
    pub tier: Tier,
}

#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub monthly_request_count: i64,
    pub total_request_count: i64,
    pub reset_date: Option<DateTime<Utc>>,
    pub tier: Tier,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequestBody {
    pub next_reset_date: Option<DateTime<Utc>>,
}
