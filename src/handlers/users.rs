use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    middleware::auth::AuthUser,
    models::user::{UpdateUserStatusRequest, User, UserResponse, UserStatus},
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub async fn get_users(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list users".to_string(),
        ));
    }

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    // Admins can read anyone; guides only themselves
    if !auth_user.is_admin() && auth_user.user_id != id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can approve or reject accounts".to_string(),
        ));
    }

    if payload.status == UserStatus::Pending {
        return Err(AppError::BadRequest(
            "Status can only be set to approved or rejected".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET status = $1, updated_at = NOW() WHERE user_id = $2 RETURNING *",
    )
    .bind(payload.status)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    LOGGER.log_business_event(
        "user_status_updated",
        Some(auth_user.user_id),
        [
            (
                "target_user_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(id)),
            ),
            (
                "status".to_string(),
                serde_json::Value::String(format!("{:?}", payload.status).to_lowercase()),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete users".to_string(),
        ));
    }

    // Guide rows cascade with the user
    let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
