use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    middleware::auth::AuthUser,
    models::certification::{Certification, CertificationWithModuleRow, CreateCertificationRequest},
    services::eligibility::EligibilityService,
    utils::errors::AppError,
    AppState,
};

pub async fn get_certifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<Certification>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list certifications".to_string(),
        ));
    }

    let certifications =
        sqlx::query_as::<_, Certification>("SELECT * FROM certifications ORDER BY issued_date DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(certifications))
}

pub async fn get_certification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<Certification>, AppError> {
    let cert = sqlx::query_as::<_, Certification>("SELECT * FROM certifications WHERE cert_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Certification not found".to_string()))?;

    if !auth_user.is_admin() {
        let owns = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM park_guides WHERE guide_id = $1 AND user_id = $2)",
        )
        .bind(cert.guide_id)
        .bind(auth_user.user_id)
        .fetch_one(&state.db)
        .await?;

        if !owns {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
    }

    Ok(Json(cert))
}

/// A guide with no certifications gets an empty array, not a 404; callers
/// render it as an ordinary empty state.
pub async fn get_guide_certifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(guide_id): Path<i32>,
) -> Result<Json<Vec<CertificationWithModuleRow>>, AppError> {
    if !auth_user.is_admin() {
        let owns = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM park_guides WHERE guide_id = $1 AND user_id = $2)",
        )
        .bind(guide_id)
        .bind(auth_user.user_id)
        .fetch_one(&state.db)
        .await?;

        if !owns {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }
    }

    let eligibility_service = EligibilityService::new(state.db.clone());
    let certifications = eligibility_service.guide_certifications(guide_id).await?;

    Ok(Json(certifications))
}

pub async fn create_certification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateCertificationRequest>,
) -> Result<(StatusCode, Json<Certification>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create certifications directly".to_string(),
        ));
    }

    let cert = sqlx::query_as::<_, Certification>(
        r#"
        INSERT INTO certifications (guide_id, module_id, issued_date, expiry_date)
        VALUES ($1, $2, COALESCE($3, CURRENT_DATE), $4)
        RETURNING *
        "#,
    )
    .bind(payload.guide_id)
    .bind(payload.module_id)
    .bind(payload.issued_date)
    .bind(payload.expiry_date)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Conflict(
            "A certification for this guide and module already exists".to_string(),
        ),
        other => AppError::from(other),
    })?;

    Ok((StatusCode::CREATED, Json(cert)))
}

pub async fn delete_certification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete certifications".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM certifications WHERE cert_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Certification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
