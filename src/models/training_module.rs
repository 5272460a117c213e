use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingModule {
    pub module_id: i32,
    pub module_name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_compulsory: bool,
    pub video_url: Option<String>,
    pub course_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingModule {
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTrainingModuleRequest {
    #[validate(length(min = 1))]
    pub module_name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_compulsory: Option<bool>,
    #[validate(url)]
    pub video_url: Option<String>,
    pub course_content: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrainingModuleRequest {
    pub module_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_compulsory: Option<bool>,
    #[validate(url)]
    pub video_url: Option<String>,
    pub course_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModuleAccessResponse {
    pub has_access: bool,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseStatusResponse {
    pub status: String,
    pub module: TrainingModule,
    pub payment_id: Option<i32>,
    pub purchase_date: Option<DateTime<Utc>>,
}
