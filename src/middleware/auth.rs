use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    auth::JwtService,
    errors::AppError,
    handlers::AppState,
};

/// Identity of the caller, decoded from the bearer token of each request.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

        let jwt_service = JwtService::new(&state.config.jwt_secret, &state.config.jwt_audience);
        let claims = jwt_service
            .verify_token(token)
            .map_err(|_| AppError::Auth("Invalid or expired token".to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Invalid token".to_string()))?;

        Ok(UserSession { user_id })
    }
}
