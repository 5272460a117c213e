use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;

use crate::{
    handlers::park_guides::guide_for_user,
    middleware::auth::AuthUser,
    models::progress::{
        GuideTrainingProgress, ProgressStatus, ProgressWithModuleRow, RecordProgressRequest,
        RecordProgressResponse, UpdateProgressRequest,
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub async fn get_all_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<GuideTrainingProgress>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list training progress".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, GuideTrainingProgress>(
        "SELECT * FROM guide_training_progress ORDER BY start_date DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<GuideTrainingProgress>, AppError> {
    let row = sqlx::query_as::<_, GuideTrainingProgress>(
        "SELECT * FROM guide_training_progress WHERE progress_id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Guide training progress not found".to_string()))?;

    if !auth_user.is_admin() {
        let guide = guide_for_user(&state.db, auth_user.user_id).await?;
        if guide.guide_id != row.guide_id {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
    }

    Ok(Json(row))
}

/// The guide's own dashboard rows: progress joined with module names,
/// restricted to modules that are free or paid-and-approved.
pub async fn get_own_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<ProgressWithModuleRow>>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let rows = sqlx::query_as::<_, ProgressWithModuleRow>(
        r#"
        SELECT gtp.progress_id, gtp.guide_id, gtp.module_id, gtp.status,
               gtp.completion_percentage, gtp.start_date, gtp.completion_date,
               tm.module_name, tm.is_compulsory
        FROM guide_training_progress gtp
        JOIN training_modules tm ON gtp.module_id = tm.module_id
        LEFT JOIN module_purchases mp
            ON mp.module_id = gtp.module_id AND mp.user_id = $1 AND mp.is_active = TRUE
        LEFT JOIN payment_transactions pt ON mp.payment_id = pt.payment_id
        WHERE gtp.guide_id = $2
          AND (tm.price = 0 OR (mp.status = 'active' AND pt.payment_status = 'approved'))
        ORDER BY gtp.completion_date DESC NULLS LAST, gtp.start_date DESC
        "#,
    )
    .bind(auth_user.user_id)
    .bind(guide.guide_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn record_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<RecordProgressRequest>,
) -> Result<(StatusCode, Json<RecordProgressResponse>), AppError> {
    // Guides may only record progress against their own guide record
    if !auth_user.is_admin() {
        let guide = guide_for_user(&state.db, auth_user.user_id).await?;
        if guide.guide_id != payload.guide_id {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
    }

    let guide_exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM park_guides pg
            JOIN users u ON pg.user_id = u.user_id
            WHERE pg.guide_id = $1 AND u.status = 'approved'
        )
        "#,
    )
    .bind(payload.guide_id)
    .fetch_one(&state.db)
    .await?;

    if !guide_exists {
        return Err(AppError::NotFound(
            "Park guide not found or not yet approved by admin".to_string(),
        ));
    }

    let existing = sqlx::query_as::<_, GuideTrainingProgress>(
        "SELECT * FROM guide_training_progress WHERE guide_id = $1 AND module_id = $2",
    )
    .bind(payload.guide_id)
    .bind(payload.module_id)
    .fetch_optional(&state.db)
    .await?;

    let (row, created, mut message) = match existing {
        Some(current) => {
            let completing = payload.status == ProgressStatus::Completed
                && current.status == ProgressStatus::InProgress;

            let row = if completing {
                let completion_date = payload
                    .completion_date
                    .unwrap_or_else(|| Utc::now().date_naive());
                sqlx::query_as::<_, GuideTrainingProgress>(
                    r#"
                    UPDATE guide_training_progress
                    SET status = 'completed', completion_percentage = 100, completion_date = $1
                    WHERE guide_id = $2 AND module_id = $3
                    RETURNING *
                    "#,
                )
                .bind(completion_date)
                .bind(payload.guide_id)
                .bind(payload.module_id)
                .fetch_one(&state.db)
                .await?
            } else {
                sqlx::query_as::<_, GuideTrainingProgress>(
                    r#"
                    UPDATE guide_training_progress
                    SET status = $1
                    WHERE guide_id = $2 AND module_id = $3
                    RETURNING *
                    "#,
                )
                .bind(payload.status)
                .bind(payload.guide_id)
                .bind(payload.module_id)
                .fetch_one(&state.db)
                .await?
            };

            let message = if completing {
                "Training module marked as completed".to_string()
            } else {
                "Training progress updated".to_string()
            };
            (row, false, message)
        }
        None => {
            let completion_date = (payload.status == ProgressStatus::Completed)
                .then(|| {
                    payload
                        .completion_date
                        .unwrap_or_else(|| Utc::now().date_naive())
                });
            let completion_percentage =
                if payload.status == ProgressStatus::Completed { 100 } else { 0 };

            let row = sqlx::query_as::<_, GuideTrainingProgress>(
                r#"
                INSERT INTO guide_training_progress
                    (guide_id, module_id, status, completion_percentage, completion_date)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(payload.guide_id)
            .bind(payload.module_id)
            .bind(payload.status)
            .bind(completion_percentage)
            .bind(completion_date)
            .fetch_one(&state.db)
            .await?;

            let message = match payload.status {
                ProgressStatus::InProgress => "Guide has started training module".to_string(),
                _ => "Training progress recorded".to_string(),
            };
            (row, true, message)
        }
    };

    // Informational check: has the guide now completed every compulsory module?
    let mut all_compulsory_completed = false;
    if payload.status == ProgressStatus::Completed {
        let (total_compulsory, completed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(tm.module_id),
                   COUNT(gtp.module_id)
            FROM training_modules tm
            LEFT JOIN guide_training_progress gtp
                ON tm.module_id = gtp.module_id
                AND gtp.guide_id = $1
                AND gtp.status = 'completed'
            WHERE tm.is_compulsory = TRUE
            "#,
        )
        .bind(payload.guide_id)
        .fetch_one(&state.db)
        .await?;

        if total_compulsory > 0 && total_compulsory == completed {
            all_compulsory_completed = true;
            message.push_str(". All compulsory modules completed! Guide is ready for certification.");
        }
    }

    LOGGER.log_business_event(
        "training_progress_recorded",
        Some(auth_user.user_id),
        [
            (
                "guide_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(payload.guide_id)),
            ),
            (
                "module_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(payload.module_id)),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    let status_code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status_code,
        Json(RecordProgressResponse {
            progress_id: row.progress_id,
            message,
            status: row.status,
            all_compulsory_completed,
        }),
    ))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<Json<GuideTrainingProgress>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can edit progress records".to_string(),
        ));
    }

    let row = sqlx::query_as::<_, GuideTrainingProgress>(
        r#"
        UPDATE guide_training_progress
        SET status = $1,
            completion_percentage = COALESCE($2, completion_percentage),
            completion_date = COALESCE($3, completion_date)
        WHERE progress_id = $4
        RETURNING *
        "#,
    )
    .bind(payload.status)
    .bind(payload.completion_percentage)
    .bind(payload.completion_date)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Guide training progress not found".to_string()))?;

    Ok(Json(row))
}

pub async fn delete_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete progress records".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM guide_training_progress WHERE progress_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Guide training progress not found".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
