use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tier;

/// Paid-entitlement snapshot as reported by the billing provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub is_active: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub renewed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Start of the current billing cycle: the last renewal, else activation.
    pub fn billing_anchor(&self) -> Option<DateTime<Utc>> {
        self.renewed_at.or(self.activated_at)
    }

    pub fn tier(&self) -> Tier {
        if self.is_active {
            Tier::Basic
        } else {
            Tier::Free
        }
    }
}
