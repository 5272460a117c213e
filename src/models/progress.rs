use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuideTrainingProgress {
    pub progress_id: i32,
    pub guide_id: i32,
    pub module_id: i32,
    pub status: ProgressStatus,
    pub completion_percentage: i32,
    pub start_date: DateTime<Utc>,
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
pub struct RecordProgressRequest {
    pub guide_id: i32,
    pub module_id: i32,
    pub status: ProgressStatus,
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub status: ProgressStatus,
    pub completion_percentage: Option<i32>,
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RecordProgressResponse {
    pub progress_id: i32,
    pub message: String,
    pub status: ProgressStatus,
    pub all_compulsory_completed: bool,
}

/// Progress row joined with module metadata for the guide dashboard.
#[derive(Debug, Serialize, FromRow)]
pub struct ProgressWithModuleRow {
    pub progress_id: i32,
    pub guide_id: i32,
    pub module_id: i32,
    pub status: ProgressStatus,
    pub completion_percentage: i32,
    pub start_date: DateTime<Utc>,
    pub completion_date: Option<NaiveDate>,
    pub module_name: String,
    pub is_compulsory: bool,
}
