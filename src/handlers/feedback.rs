use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::{
    handlers::park_guides::guide_for_user,
    middleware::auth::AuthUser,
    models::feedback::{
        FeedbackCommentRow, GuideRatingSummary, SubmitFeedbackRequest, UpdateFeedbackRequest,
        VisitorFeedback,
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

/// Public submission endpoint; visitors are not authenticated.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<VisitorFeedback>), AppError> {
    payload.validate()?;

    let guide_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM park_guides WHERE guide_id = $1)",
    )
    .bind(payload.guide_id)
    .fetch_one(&state.db)
    .await?;

    if !guide_exists {
        return Err(AppError::NotFound("Park guide not found".to_string()));
    }

    let feedback = sqlx::query_as::<_, VisitorFeedback>(
        r#"
        INSERT INTO visitor_feedback
            (visitor_name, guide_id, language_rating, knowledge_rating,
             organization_rating, engagement_rating, safety_rating, comment)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&payload.visitor_name)
    .bind(payload.guide_id)
    .bind(payload.language_rating)
    .bind(payload.knowledge_rating)
    .bind(payload.organization_rating)
    .bind(payload.engagement_rating)
    .bind(payload.safety_rating)
    .bind(&payload.comment)
    .fetch_one(&state.db)
    .await?;

    LOGGER.log_business_event(
        "visitor_feedback_submitted",
        None,
        [(
            "guide_id".to_string(),
            serde_json::Value::Number(serde_json::Number::from(payload.guide_id)),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn get_all_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<VisitorFeedback>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list visitor feedback".to_string(),
        ));
    }

    let feedback = sqlx::query_as::<_, VisitorFeedback>(
        "SELECT * FROM visitor_feedback ORDER BY submitted_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(feedback))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<VisitorFeedback>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can read individual feedback".to_string(),
        ));
    }

    let feedback = sqlx::query_as::<_, VisitorFeedback>(
        "SELECT * FROM visitor_feedback WHERE feedback_id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Visitor feedback not found".to_string()))?;

    Ok(Json(feedback))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFeedbackRequest>,
) -> Result<Json<VisitorFeedback>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update visitor feedback".to_string(),
        ));
    }

    payload.validate()?;

    let feedback = sqlx::query_as::<_, VisitorFeedback>(
        r#"
        UPDATE visitor_feedback
        SET visitor_name = $1, guide_id = $2, language_rating = $3,
            knowledge_rating = $4, organization_rating = $5,
            engagement_rating = $6, safety_rating = $7, comment = $8
        WHERE feedback_id = $9
        RETURNING *
        "#,
    )
    .bind(&payload.visitor_name)
    .bind(payload.guide_id)
    .bind(payload.language_rating)
    .bind(payload.knowledge_rating)
    .bind(payload.organization_rating)
    .bind(payload.engagement_rating)
    .bind(payload.safety_rating)
    .bind(&payload.comment)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Visitor feedback not found".to_string()))?;

    Ok(Json(feedback))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete visitor feedback".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM visitor_feedback WHERE feedback_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Visitor feedback not found".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Per-dimension averages for the authenticated guide's radar chart.
pub async fn get_own_rating_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<GuideRatingSummary>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let summary = sqlx::query_as::<_, GuideRatingSummary>(
        r#"
        SELECT
            ROUND(AVG(language_rating), 1)::float8 AS language,
            ROUND(AVG(knowledge_rating), 1)::float8 AS knowledge,
            ROUND(AVG(organization_rating), 1)::float8 AS organization,
            ROUND(AVG(engagement_rating), 1)::float8 AS engagement,
            ROUND(AVG(safety_rating), 1)::float8 AS safety,
            COUNT(*) AS feedback_count
        FROM visitor_feedback
        WHERE guide_id = $1
        "#,
    )
    .bind(guide.guide_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(summary))
}

pub async fn get_own_rating_comments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<FeedbackCommentRow>>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let comments = sqlx::query_as::<_, FeedbackCommentRow>(
        r#"
        SELECT feedback_id, visitor_name, comment, submitted_at
        FROM visitor_feedback
        WHERE guide_id = $1 AND comment IS NOT NULL AND comment <> ''
        ORDER BY submitted_at DESC
        LIMIT 50
        "#,
    )
    .bind(guide.guide_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(comments))
}
