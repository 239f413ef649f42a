use anyhow::{bail, Result};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub usage_store: StoreBackend,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub free_tier_monthly_limit: u32,
    pub basic_tier_monthly_limit: u32,
    pub entitlement: EntitlementConfig,
}

#[derive(Debug, Clone)]
pub struct EntitlementConfig {
    pub api_url: Option<String>,
    pub api_key: String,
    pub access_level: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let usage_store = match env::var("USAGE_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("Unsupported usage store: {}", other),
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/eversvoz".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            usage_store,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".to_string()),
            free_tier_monthly_limit: env::var("FREE_TIER_MONTHLY_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            basic_tier_monthly_limit: env::var("BASIC_TIER_MONTHLY_LIMIT")
                .unwrap_or_else(|_| "200".to_string())
                .parse()?,
            entitlement: EntitlementConfig {
                api_url: env::var("ENTITLEMENT_API_URL").ok().filter(|url| !url.is_empty()),
                api_key: env::var("ENTITLEMENT_API_KEY").unwrap_or_default(),
                access_level: env::var("ENTITLEMENT_ACCESS_LEVEL")
                    .unwrap_or_else(|_| "basic_tier".to_string()),
                timeout_secs: env::var("ENTITLEMENT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
        })
    }

    /// Settings for running against in-memory collaborators.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Config {
            database_url: String::new(),
            port: 0,
            usage_store: StoreBackend::Memory,
            jwt_secret: jwt_secret.to_string(),
            jwt_audience: "authenticated".to_string(),
            free_tier_monthly_limit: 10,
            basic_tier_monthly_limit: 200,
            entitlement: EntitlementConfig {
                api_url: None,
                api_key: String::new(),
                access_level: "basic_tier".to_string(),
                timeout_secs: 10,
            },
        }
    }
}
