use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    handlers::park_guides::guide_for_user,
    middleware::auth::AuthUser,
    services::notification::{ExpiringCertification, NotificationService},
    utils::errors::AppError,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub days: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub message: String,
    pub processed_guides: usize,
    pub total_expiring_certifications: usize,
}

pub async fn trigger_notifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationResponse>, StatusCode> {
    // Only admins can trigger reminders manually
    if !auth_user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let notification_service = NotificationService::new(state.db.clone());
    let days = query.days.unwrap_or(30);

    let expiring = notification_service
        .find_expiring_certifications(days)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut unique_guides = std::collections::HashSet::new();
    for cert in &expiring {
        unique_guides.insert(cert.guide_id);
    }

    notification_service
        .process_expiry_reminders_with_days(days)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(NotificationResponse {
        message: format!(
            "Expiry reminders processed for certifications within {} days",
            days
        ),
        processed_guides: unique_guides.len(),
        total_expiring_certifications: expiring.len(),
    }))
}

pub async fn get_expiring_certifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<ExpiringCertification>>, AppError> {
    let notification_service = NotificationService::new(state.db.clone());
    let days = query.days.unwrap_or(30);

    let expiring = if auth_user.is_admin() {
        notification_service
            .find_expiring_certifications(days)
            .await
            .map_err(|_| {
                AppError::InternalServerError("Failed to fetch expiring certifications".to_string())
            })?
    } else {
        let guide = guide_for_user(&state.db, auth_user.user_id).await?;
        notification_service
            .find_guide_expiring_certifications(guide.guide_id, days)
            .await
            .map_err(|_| {
                AppError::InternalServerError("Failed to fetch expiring certifications".to_string())
            })?
    };

    Ok(Json(expiring))
}
