use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InfoDoc {
    pub doc_id: i32,
    pub title: String,
    pub category: Option<String>,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInfoDocRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInfoDocRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub published: Option<bool>,
}
