use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::park::{CreateParkRequest, Park, UpdateParkRequest},
    utils::errors::AppError,
    AppState,
};

pub async fn get_parks(State(state): State<AppState>) -> Result<Json<Vec<Park>>, AppError> {
    let parks = sqlx::query_as::<_, Park>("SELECT * FROM parks ORDER BY park_name ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(parks))
}

pub async fn get_park(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Park>, AppError> {
    let park = sqlx::query_as::<_, Park>("SELECT * FROM parks WHERE park_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Park not found".to_string()))?;

    Ok(Json(park))
}

pub async fn create_park(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateParkRequest>,
) -> Result<(StatusCode, Json<Park>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create parks".to_string(),
        ));
    }

    payload.validate()?;

    let park = sqlx::query_as::<_, Park>(
        r#"
        INSERT INTO parks (park_name, location, description, wildlife)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&payload.park_name)
    .bind(&payload.location)
    .bind(&payload.description)
    .bind(&payload.wildlife)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(park)))
}

pub async fn update_park(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateParkRequest>,
) -> Result<Json<Park>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update parks".to_string(),
        ));
    }

    payload.validate()?;

    let park = sqlx::query_as::<_, Park>(
        r#"
        UPDATE parks
        SET park_name = $1, location = $2, description = $3, wildlife = $4
        WHERE park_id = $5
        RETURNING *
        "#,
    )
    .bind(&payload.park_name)
    .bind(&payload.location)
    .bind(&payload.description)
    .bind(&payload.wildlife)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Park not found".to_string()))?;

    Ok(Json(park))
}

pub async fn delete_park(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete parks".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM parks WHERE park_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Park not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
