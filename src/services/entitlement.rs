use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::EntitlementConfig,
    errors::{AppError, Result},
    models::SubscriptionStatus,
};

/// Read-only view of a user's paid entitlement.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    async fn subscription_status(&self, user_id: Uuid) -> Result<SubscriptionStatus>;
}

pub fn create_entitlement_provider(config: &EntitlementConfig) -> Result<Arc<dyn EntitlementProvider>> {
    match config.api_url {
        Some(ref api_url) => {
            let provider = HttpEntitlementProvider::new(
                api_url,
                &config.api_key,
                &config.access_level,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("No entitlement provider configured; every user is on the free tier");
            Ok(Arc::new(StaticEntitlements::new()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: Profile,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    access_levels: Vec<AccessLevel>,
}

#[derive(Debug, Deserialize)]
struct AccessLevel {
    access_level_id: String,
    is_active: Option<bool>,
    #[serde(alias = "starts_at")]
    activated_at: Option<DateTime<Utc>>,
    renewed_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessLevel {
    fn into_status(self, now: DateTime<Utc>) -> SubscriptionStatus {
        let is_active = self
            .is_active
            .unwrap_or_else(|| self.expires_at.map_or(true, |expires_at| expires_at > now));

        SubscriptionStatus {
            is_active,
            activated_at: self.activated_at,
            renewed_at: self.renewed_at,
            expires_at: self.expires_at,
        }
    }
}

pub struct HttpEntitlementProvider {
    client: Client,
    profile_url: String,
    api_key: String,
    access_level: String,
}

impl HttpEntitlementProvider {
    pub fn new(api_url: &str, api_key: &str, access_level: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            profile_url: format!("{}/profile", api_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            access_level: access_level.to_string(),
        })
    }
}

#[async_trait]
impl EntitlementProvider for HttpEntitlementProvider {
    async fn subscription_status(&self, user_id: Uuid) -> Result<SubscriptionStatus> {
        let response = self
            .client
            .get(&self.profile_url)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .header("customer-user-id", user_id.to_string())
            .send()
            .await?;

        // Users who never opened the paywall have no profile yet
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SubscriptionStatus::inactive());
        }

        if !response.status().is_success() {
            return Err(AppError::EntitlementResponse(format!(
                "Profile lookup returned status {}",
                response.status()
            )));
        }

        let profile: ProfileResponse = response.json().await?;
        let status = profile
            .data
            .access_levels
            .into_iter()
            .find(|level| level.access_level_id == self.access_level)
            .map(|level| level.into_status(Utc::now()))
            .unwrap_or_default();

        tracing::debug!(%user_id, is_active = status.is_active, "Fetched subscription status");
        Ok(status)
    }
}

/// Fixed snapshots per user; users without one are inactive.
#[derive(Clone, Default)]
pub struct StaticEntitlements {
    statuses: Arc<RwLock<HashMap<Uuid, SubscriptionStatus>>>,
}

impl StaticEntitlements {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, user_id: Uuid, status: SubscriptionStatus) {
        self.statuses.write().await.insert(user_id, status);
    }
}

#[async_trait]
impl EntitlementProvider for StaticEntitlements {
    async fn subscription_status(&self, user_id: Uuid) -> Result<SubscriptionStatus> {
        Ok(self
            .statuses
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}
