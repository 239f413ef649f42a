use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Entitlement provider error: {0}")]
    Entitlement(#[from] reqwest::Error),

    #[error("Entitlement provider returned an invalid response: {0}")]
    EntitlementResponse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The reset was decided but could not be written back. The decision is
    /// still usable for the in-flight request.
    #[error("Usage reset to {next_reset_date} was not persisted: {source}")]
    ResetNotPersisted {
        next_reset_date: DateTime<Utc>,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Next reset date carried by a failed reset write, if any. Callers use it
    /// to keep serving the recomputed cycle while the store is unavailable.
    pub fn pending_reset(&self) -> Option<DateTime<Utc>> {
        match self {
            AppError::ResetNotPersisted { next_reset_date, .. } => Some(*next_reset_date),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Migration(_) => "database",
            AppError::Entitlement(_) | AppError::EntitlementResponse(_) => "entitlement",
            AppError::Auth(_) => "auth",
            AppError::Validation(_) => "validation",
            AppError::NotFound => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::QuotaExceeded(_) => "quota_exceeded",
            AppError::ResetNotPersisted { .. } => "reset_not_persisted",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Entitlement(ref e) => {
                tracing::error!("Entitlement provider error: {}", e);
                (StatusCode::BAD_GATEWAY, "Entitlement provider unavailable".to_string())
            }
            AppError::EntitlementResponse(ref msg) => {
                tracing::error!("Entitlement provider response: {}", msg);
                (StatusCode::BAD_GATEWAY, "Entitlement provider unavailable".to_string())
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Usage record not found".to_string()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::QuotaExceeded(ref msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            AppError::ResetNotPersisted { ref source, .. } => {
                tracing::error!("Usage reset not persisted: {}", source);
                (StatusCode::SERVICE_UNAVAILABLE, "Usage store unavailable".to_string())
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pending_reset_only_on_persist_failure() {
        let next = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        let err = AppError::ResetNotPersisted {
            next_reset_date: next,
            source: Box::new(AppError::Validation("boom".to_string())),
        };

        assert_eq!(err.pending_reset(), Some(next));
        assert_eq!(err.kind(), "reset_not_persisted");
        assert_eq!(AppError::NotFound.pending_reset(), None);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Auth("nope".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Conflict("exists".to_string()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::QuotaExceeded("used up".to_string()).into_response().status(),
            StatusCode::PAYMENT_REQUIRED
        );
    }
}
