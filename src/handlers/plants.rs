use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::plant::{CreatePlantRequest, Plant, UpdatePlantRequest},
    utils::errors::AppError,
    AppState,
};

pub async fn get_plants(State(state): State<AppState>) -> Result<Json<Vec<Plant>>, AppError> {
    let plants = sqlx::query_as::<_, Plant>("SELECT * FROM plants ORDER BY common_name ASC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(plants))
}

pub async fn get_plant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Plant>, AppError> {
    let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE plant_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Plant not found".to_string()))?;

    Ok(Json(plant))
}

pub async fn create_plant(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreatePlantRequest>,
) -> Result<(StatusCode, Json<Plant>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create plants".to_string(),
        ));
    }

    payload.validate()?;

    let plant = sqlx::query_as::<_, Plant>(
        r#"
        INSERT INTO plants (common_name, scientific_name, description, habitat, image_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&payload.common_name)
    .bind(&payload.scientific_name)
    .bind(&payload.description)
    .bind(&payload.habitat)
    .bind(&payload.image_url)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(plant)))
}

pub async fn update_plant(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePlantRequest>,
) -> Result<Json<Plant>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update plants".to_string(),
        ));
    }

    payload.validate()?;

    let plant = sqlx::query_as::<_, Plant>(
        r#"
        UPDATE plants
        SET common_name = $1, scientific_name = $2, description = $3,
            habitat = $4, image_url = $5
        WHERE plant_id = $6
        RETURNING *
        "#,
    )
    .bind(&payload.common_name)
    .bind(&payload.scientific_name)
    .bind(&payload.description)
    .bind(&payload.habitat)
    .bind(&payload.image_url)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Plant not found".to_string()))?;

    Ok(Json(plant))
}

pub async fn delete_plant(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete plants".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM plants WHERE plant_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Plant not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
