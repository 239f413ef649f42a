use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::json;

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::auth::UserSession,
    models::RecordRequestBody,
    services::usage_reset::ResetDecision,
};

pub async fn provision_usage(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let record = state.quota.provision(session.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Usage record created",
            "data": record
        })),
    ))
}

pub async fn get_usage(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<serde_json::Value>> {
    let summary = state.quota.usage_summary(session.user_id).await?;

    Ok(Json(json!({
        "message": "Usage retrieved successfully",
        "data": summary
    })))
}

pub async fn check_request(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<serde_json::Value>> {
    let check = state.quota.check_request(session.user_id).await?;
    let message = if check.is_allowed() {
        "Request allowed"
    } else {
        "Monthly quota reached"
    };

    Ok(Json(json!({
        "message": message,
        "data": check
    })))
}

pub async fn record_request(
    State(state): State<AppState>,
    session: UserSession,
    Json(body): Json<RecordRequestBody>,
) -> Result<Json<serde_json::Value>> {
    let claimed = ResetDecision::from(body.next_reset_date);

    let record = state.quota.record_request(session.user_id, claimed).await?;

    Ok(Json(json!({
        "message": "Request recorded",
        "data": record
    })))
}

pub async fn apply_purchase(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<serde_json::Value>> {
    let record = state.quota.apply_purchase(session.user_id).await?;

    Ok(Json(json!({
        "message": "Subscription applied",
        "data": record
    })))
}

pub async fn delete_usage(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<serde_json::Value>> {
    state.quota.remove(session.user_id).await?;

    Ok(Json(json!({
        "message": "Usage record deleted"
    })))
}
