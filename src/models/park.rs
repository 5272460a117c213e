use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Park {
    pub park_id: i32,
    pub park_name: String,
    pub location: String,
    pub description: Option<String>,
    pub wildlife: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateParkRequest {
    #[validate(length(min = 1))]
    pub park_name: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub description: Option<String>,
    pub wildlife: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateParkRequest {
    #[validate(length(min = 1))]
    pub park_name: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub description: Option<String>,
    pub wildlife: Option<String>,
}
