use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::{middleware::auth::AuthUser, AppState};

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_users: i64,
    pub pending_user_approvals: i64,
    pub total_guides: i64,
    pub guide_status_breakdown: HashMap<String, i64>,
    pub module_stats: ModuleStats,
    pub payment_stats: PaymentStats,
    pub certification_stats: CertificationStats,
    pub rating_averages: RatingAverages,
    pub top_rated_guides: Vec<GuideRatingRow>,
}

#[derive(Debug, Serialize)]
pub struct ModuleStats {
    pub total_modules: i64,
    pub compulsory_modules: i64,
    pub active_purchases: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub approved_revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CertificationStats {
    pub total_issued: i64,
    pub expiring_within_30_days: i64,
    pub issued_per_month: Vec<MonthlyIssued>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyIssued {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct RatingAverages {
    pub language: Option<f64>,
    pub knowledge: Option<f64>,
    pub organization: Option<f64>,
    pub engagement: Option<f64>,
    pub safety: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GuideRatingRow {
    pub guide_id: i32,
    pub guide_name: String,
    pub average_rating: f64,
    pub feedback_count: i64,
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AnalyticsResponse>, StatusCode> {
    use crate::services::analytics::{AnalyticsError, AnalyticsService};
    use crate::utils::logger::LOGGER;

    if !auth_user.is_admin() {
        LOGGER.log_business_event(
            "unauthorized_analytics_access",
            Some(auth_user.user_id),
            [(
                "role".to_string(),
                serde_json::Value::String(auth_user.role_str().to_string()),
            )]
            .iter()
            .cloned()
            .collect(),
        );
        return Err(StatusCode::FORBIDDEN);
    }

    LOGGER.log_request("GET", "/api/admin/analytics", Some(auth_user.user_id), 200);

    let analytics_service = AnalyticsService::new(state.db.clone());

    match analytics_service.get_dashboard_analytics().await {
        Ok(analytics) => {
            LOGGER.log_business_event(
                "analytics_request_completed",
                Some(auth_user.user_id),
                HashMap::new(),
            );
            Ok(Json(analytics))
        }
        Err(AnalyticsError::DatabaseError(msg)) => {
            let mut context = HashMap::new();
            context.insert(
                "user_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(auth_user.user_id)),
            );
            context.insert(
                "error_type".to_string(),
                serde_json::Value::String("database".to_string()),
            );
            LOGGER.log_error(&msg, context);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
