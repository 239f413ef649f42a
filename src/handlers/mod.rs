use crate::{
    config::Config,
    models::TierLimits,
    services::{entitlement::EntitlementProvider, metrics::MetricsService, quota_manager::QuotaManager},
    storage::UsageStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

pub mod health;
pub mod metrics;
pub mod usage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UsageStore>,
    pub quota: QuotaManager,
    pub metrics: Arc<MetricsService>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UsageStore>,
        entitlements: Arc<dyn EntitlementProvider>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let metrics = Arc::new(MetricsService::new());
        let limits = TierLimits {
            free: config.free_tier_monthly_limit,
            basic: config.basic_tier_monthly_limit,
        };
        let quota = QuotaManager::new(store.clone(), entitlements, limits, metrics.clone());

        Self {
            config,
            store,
            quota,
            metrics,
            metrics_handle,
        }
    }
}
