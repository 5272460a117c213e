use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plant {
    pub plant_id: i32,
    pub common_name: String,
    pub scientific_name: String,
    pub description: Option<String>,
    pub habitat: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlantRequest {
    #[validate(length(min = 1))]
    pub common_name: String,
    #[validate(length(min = 1))]
    pub scientific_name: String,
    pub description: Option<String>,
    pub habitat: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlantRequest {
    #[validate(length(min = 1))]
    pub common_name: String,
    #[validate(length(min = 1))]
    pub scientific_name: String,
    pub description: Option<String>,
    pub habitat: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}
