use metrics::{counter, histogram};
use std::time::Instant;

use crate::models::Tier;

pub struct MetricsService;

impl MetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn record_reset(&self, trigger: &'static str) {
        counter!("usage_resets_total", "trigger" => trigger).increment(1);
    }

    pub fn record_billed_request(&self, tier: Tier) {
        counter!("billed_requests_total", "tier" => tier.as_str()).increment(1);
    }

    pub fn record_quota_denial(&self, tier: Tier) {
        counter!("quota_denials_total", "tier" => tier.as_str()).increment(1);
    }

    pub fn record_purchase(&self) {
        counter!("purchases_applied_total").increment(1);
    }

    pub fn record_error(&self, error_type: &str) {
        counter!("errors_total", "type" => error_type.to_string()).increment(1);
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RequestTimer {
    start: Instant,
    endpoint: String,
}

impl RequestTimer {
    pub fn new(endpoint: String) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        histogram!("request_duration_seconds", "endpoint" => self.endpoint.clone())
            .record(duration.as_secs_f64());
    }
}
