pub mod entitlement;
pub mod metrics;
pub mod quota_manager;
pub mod renewal;
pub mod usage_reset;

pub use entitlement::*;
pub use self::metrics::*;
pub use quota_manager::*;
pub use renewal::*;
pub use usage_reset::*;
