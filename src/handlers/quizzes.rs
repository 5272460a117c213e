use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

use crate::{
    handlers::{park_guides::guide_for_user, training_modules::find_module},
    middleware::auth::AuthUser,
    models::quiz::{
        AnswerOptionResponse, ModuleQuizResponse, QuestionResponse, Quiz, QuizAnswerOption,
        QuizCompletionRow, QuizQuestion, QuizResultResponse, SubmitQuizRequest,
    },
    services::{
        enrollment::EnrollmentService,
        grading::{is_passing, score_answers},
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

async fn find_module_quiz(db: &sqlx::PgPool, module_id: i32) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE module_id = $1")
        .bind(module_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("No quiz available for this module".to_string()))
}

async fn attempts_used(db: &sqlx::PgPool, quiz_id: i32, guide_id: i32) -> Result<i32, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND guide_id = $2",
    )
    .bind(quiz_id)
    .bind(guide_id)
    .fetch_one(db)
    .await?;

    Ok(count as i32)
}

pub async fn get_module_quiz(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ModuleQuizResponse>, AppError> {
    let module = find_module(&state.db, id).await?;

    let enrollment_service = EnrollmentService::new(state.db.clone());
    let access = enrollment_service
        .module_access(auth_user.user_id, &module)
        .await?;
    if !access.has_access() {
        return Err(AppError::Forbidden(
            "Access denied. You must purchase this module first.".to_string(),
        ));
    }

    let quiz = find_module_quiz(&state.db, module.module_id).await?;
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let used = attempts_used(&state.db, quiz.quiz_id, guide.guide_id).await?;
    if used >= quiz.attempts_allowed {
        return Err(AppError::Forbidden(format!(
            "You have reached the maximum number of attempts for this quiz ({} of {})",
            used, quiz.attempts_allowed
        )));
    }

    let questions = sqlx::query_as::<_, QuizQuestion>(
        "SELECT * FROM quiz_questions WHERE quiz_id = $1 ORDER BY sequence_number",
    )
    .bind(quiz.quiz_id)
    .fetch_all(&state.db)
    .await?;

    let options = sqlx::query_as::<_, QuizAnswerOption>(
        r#"
        SELECT o.* FROM quiz_answer_options o
        JOIN quiz_questions q ON o.question_id = q.question_id
        WHERE q.quiz_id = $1
        ORDER BY o.sequence_number
        "#,
    )
    .bind(quiz.quiz_id)
    .fetch_all(&state.db)
    .await?;

    let mut options_by_question: HashMap<i32, Vec<AnswerOptionResponse>> = HashMap::new();
    for option in options {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(AnswerOptionResponse::from(option));
    }

    let questions = questions
        .into_iter()
        .map(|q| QuestionResponse {
            options: options_by_question.remove(&q.question_id).unwrap_or_default(),
            question_id: q.question_id,
            question_text: q.question_text,
            sequence_number: q.sequence_number,
            points: q.points,
        })
        .collect();

    Ok(Json(ModuleQuizResponse {
        quiz_id: quiz.quiz_id,
        module_id: quiz.module_id,
        title: quiz.title,
        description: quiz.description,
        pass_percentage: quiz.pass_percentage,
        attempts_allowed: quiz.attempts_allowed,
        attempts_used: used,
        questions,
    }))
}

pub async fn submit_quiz_completion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<Json<QuizResultResponse>, AppError> {
    payload.validate()?;

    let module = find_module(&state.db, payload.module_id).await?;
    let quiz = find_module_quiz(&state.db, module.module_id).await?;
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let enrollment_service = EnrollmentService::new(state.db.clone());
    let access = enrollment_service
        .module_access(auth_user.user_id, &module)
        .await?;
    if !access.has_access() {
        return Err(AppError::Forbidden(
            "Access denied. You must purchase this module first.".to_string(),
        ));
    }

    let used = attempts_used(&state.db, quiz.quiz_id, guide.guide_id).await?;
    if used >= quiz.attempts_allowed {
        return Err(AppError::Forbidden(format!(
            "You have reached the maximum number of attempts for this quiz ({} of {})",
            used, quiz.attempts_allowed
        )));
    }

    // Web submissions carry answers and are graded here; the mobile client
    // reports a raw score instead.
    let (score, total_questions) = match (&payload.answers, payload.score, payload.total_questions)
    {
        (Some(answers), _, _) => {
            let rows = sqlx::query_as::<_, (i32, i32)>(
                r#"
                SELECT q.question_id, o.option_id
                FROM quiz_questions q
                JOIN quiz_answer_options o ON o.question_id = q.question_id
                WHERE q.quiz_id = $1 AND o.is_correct = TRUE
                "#,
            )
            .bind(quiz.quiz_id)
            .fetch_all(&state.db)
            .await?;

            let correct_options: HashMap<i32, i32> = rows.into_iter().collect();
            if correct_options.is_empty() {
                return Err(AppError::InternalServerError(
                    "Quiz has no answer key".to_string(),
                ));
            }
            score_answers(&correct_options, answers)
        }
        (None, Some(score), Some(total)) => (score.min(total), total),
        _ => {
            return Err(AppError::BadRequest(
                "Either answers or score and total_questions are required".to_string(),
            ))
        }
    };

    let passed = is_passing(score, total_questions, quiz.pass_percentage);

    let mut tx = state.db.begin().await?;

    let attempt_number = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT COALESCE(MAX(attempt_number), 0) + 1
        FROM quiz_attempts
        WHERE quiz_id = $1 AND guide_id = $2
        "#,
    )
    .bind(quiz.quiz_id)
    .bind(guide.guide_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO quiz_attempts
            (quiz_id, guide_id, module_id, score, total_questions, passed, attempt_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(quiz.quiz_id)
    .bind(guide.guide_id)
    .bind(module.module_id)
    .bind(score)
    .bind(total_questions)
    .bind(passed)
    .bind(attempt_number)
    .execute(&mut *tx)
    .await?;

    if passed {
        sqlx::query(
            r#"
            INSERT INTO guide_training_progress
                (guide_id, module_id, status, completion_percentage, completion_date)
            VALUES ($1, $2, 'completed', 100, CURRENT_DATE)
            ON CONFLICT (guide_id, module_id) DO UPDATE
            SET status = 'completed', completion_percentage = 100,
                completion_date = CURRENT_DATE
            "#,
        )
        .bind(guide.guide_id)
        .bind(module.module_id)
        .execute(&mut *tx)
        .await?;

        // One certification per guide and module; re-passing does not reissue
        let expiry = (Utc::now() + Duration::days(365)).date_naive();
        sqlx::query(
            r#"
            INSERT INTO certifications (guide_id, module_id, issued_date, expiry_date)
            VALUES ($1, $2, CURRENT_DATE, $3)
            ON CONFLICT (guide_id, module_id) DO NOTHING
            "#,
        )
        .bind(guide.guide_id)
        .bind(module.module_id)
        .bind(expiry)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let pass_percentage = if total_questions > 0 {
        ((score as f64 / total_questions as f64) * 100.0).round() as i32
    } else {
        0
    };

    LOGGER.log_business_event(
        "quiz_completed",
        Some(auth_user.user_id),
        [
            (
                "module_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(module.module_id)),
            ),
            ("passed".to_string(), serde_json::Value::Bool(passed)),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    let message = if passed {
        "Congratulations! You passed the quiz and earned a certificate.".to_string()
    } else {
        "You did not pass the quiz. Please try again.".to_string()
    };

    Ok(Json(QuizResultResponse {
        success: true,
        passed,
        score,
        total_questions,
        pass_percentage,
        attempt_number,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CompletionsQuery {
    pub module_id: Option<i32>,
}

pub async fn get_quiz_completions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CompletionsQuery>,
) -> Result<Json<Vec<QuizCompletionRow>>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let rows = match query.module_id {
        Some(module_id) => {
            sqlx::query_as::<_, QuizCompletionRow>(
                r#"
                SELECT qa.attempt_id, qa.module_id, tm.module_name, qa.score,
                       qa.total_questions, qa.passed, qa.attempt_number, qa.completed_at
                FROM quiz_attempts qa
                JOIN training_modules tm ON qa.module_id = tm.module_id
                WHERE qa.guide_id = $1 AND qa.module_id = $2
                ORDER BY qa.completed_at DESC
                "#,
            )
            .bind(guide.guide_id)
            .bind(module_id)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, QuizCompletionRow>(
                r#"
                SELECT qa.attempt_id, qa.module_id, tm.module_name, qa.score,
                       qa.total_questions, qa.passed, qa.attempt_number, qa.completed_at
                FROM quiz_attempts qa
                JOIN training_modules tm ON qa.module_id = tm.module_id
                WHERE qa.guide_id = $1
                ORDER BY qa.completed_at DESC
                "#,
            )
            .bind(guide.guide_id)
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(rows))
}
