use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub quiz_id: i32,
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub pass_percentage: f64,
    pub attempts_allowed: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizQuestion {
    pub question_id: i32,
    pub quiz_id: i32,
    pub question_text: String,
    pub sequence_number: i32,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAnswerOption {
    pub option_id: i32,
    pub question_id: i32,
    pub option_text: String,
    pub is_correct: bool,
    pub sequence_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub attempt_id: i32,
    pub quiz_id: i32,
    pub guide_id: i32,
    pub module_id: i32,
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub attempt_number: i32,
    pub completed_at: DateTime<Utc>,
}

/// Answer option as exposed to quiz takers. The correct flag stays server-side.
#[derive(Debug, Serialize)]
pub struct AnswerOptionResponse {
    pub option_id: i32,
    pub option_text: String,
    pub sequence_number: i32,
}

impl From<QuizAnswerOption> for AnswerOptionResponse {
    fn from(option: QuizAnswerOption) -> Self {
        Self {
            option_id: option.option_id,
            option_text: option.option_text,
            sequence_number: option.sequence_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question_id: i32,
    pub question_text: String,
    pub sequence_number: i32,
    pub points: i32,
    pub options: Vec<AnswerOptionResponse>,
}

#[derive(Debug, Serialize)]
pub struct ModuleQuizResponse {
    pub quiz_id: i32,
    pub module_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub pass_percentage: f64,
    pub attempts_allowed: i32,
    pub attempts_used: i32,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerSelection {
    pub question_id: i32,
    pub selected_option_id: i32,
}

/// Submission body. Web clients send `answers` for server-side grading; the
/// mobile client reports a raw `score`/`total_questions` pair instead.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    pub module_id: i32,
    pub answers: Option<Vec<AnswerSelection>>,
    #[validate(range(min = 0))]
    pub score: Option<i32>,
    #[validate(range(min = 1))]
    pub total_questions: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct QuizResultResponse {
    pub success: bool,
    pub passed: bool,
    pub score: i32,
    pub total_questions: i32,
    pub pass_percentage: i32,
    pub attempt_number: i32,
    pub message: String,
}

/// Attempt row joined with the module name for history listings.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizCompletionRow {
    pub attempt_id: i32,
    pub module_id: i32,
    pub module_name: String,
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub attempt_number: i32,
    pub completed_at: DateTime<Utc>,
}
