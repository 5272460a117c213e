use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::info_doc::{CreateInfoDocRequest, InfoDoc, UpdateInfoDocRequest},
    utils::errors::AppError,
    AppState,
};

pub async fn get_info_docs(State(state): State<AppState>) -> Result<Json<Vec<InfoDoc>>, AppError> {
    let docs = sqlx::query_as::<_, InfoDoc>(
        "SELECT * FROM info_docs WHERE published = TRUE ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(docs))
}

pub async fn get_info_doc(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<InfoDoc>, AppError> {
    let doc = sqlx::query_as::<_, InfoDoc>(
        "SELECT * FROM info_docs WHERE doc_id = $1 AND published = TRUE",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Info document not found".to_string()))?;

    Ok(Json(doc))
}

pub async fn create_info_doc(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateInfoDocRequest>,
) -> Result<(StatusCode, Json<InfoDoc>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create info documents".to_string(),
        ));
    }

    payload.validate()?;

    let doc = sqlx::query_as::<_, InfoDoc>(
        r#"
        INSERT INTO info_docs (title, category, content, published)
        VALUES ($1, $2, $3, COALESCE($4, TRUE))
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.category)
    .bind(&payload.content)
    .bind(payload.published)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn update_info_doc(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInfoDocRequest>,
) -> Result<Json<InfoDoc>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update info documents".to_string(),
        ));
    }

    payload.validate()?;

    let doc = sqlx::query_as::<_, InfoDoc>(
        r#"
        UPDATE info_docs
        SET title = $1, category = $2, content = $3,
            published = COALESCE($4, published), updated_at = NOW()
        WHERE doc_id = $5
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.category)
    .bind(&payload.content)
    .bind(payload.published)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Info document not found".to_string()))?;

    Ok(Json(doc))
}

pub async fn delete_info_doc(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete info documents".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM info_docs WHERE doc_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Info document not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
