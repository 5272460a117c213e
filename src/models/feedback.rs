use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitorFeedback {
    pub feedback_id: i32,
    pub visitor_name: Option<String>,
    pub guide_id: i32,
    pub language_rating: i32,
    pub knowledge_rating: i32,
    pub organization_rating: i32,
    pub engagement_rating: i32,
    pub safety_rating: i32,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackRequest {
    pub visitor_name: Option<String>,
    pub guide_id: i32,
    #[validate(range(min = 1, max = 5))]
    pub language_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub knowledge_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub organization_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub engagement_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub safety_rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFeedbackRequest {
    pub visitor_name: Option<String>,
    pub guide_id: i32,
    #[validate(range(min = 1, max = 5))]
    pub language_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub knowledge_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub organization_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub engagement_rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub safety_rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Per-dimension averages, the radar chart source for guide dashboards.
#[derive(Debug, Serialize, FromRow)]
pub struct GuideRatingSummary {
    pub language: Option<f64>,
    pub knowledge: Option<f64>,
    pub organization: Option<f64>,
    pub engagement: Option<f64>,
    pub safety: Option<f64>,
    pub feedback_count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct FeedbackCommentRow {
    pub feedback_id: i32,
    pub visitor_name: Option<String>,
    pub comment: String,
    pub submitted_at: DateTime<Utc>,
}
