use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};

use crate::{
    middleware::auth::AuthUser,
    models::park_guide::{
        CertificationDecision, CertificationDecisionRequest, CreateParkGuideRequest,
        GuideProfileResponse, LicenseApprovalRequest, ParkGuide, PendingCertificationRow,
        UpdateParkGuideRequest,
    },
    services::eligibility::EligibilityService,
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub(crate) async fn guide_for_user(db: &sqlx::PgPool, user_id: i32) -> Result<ParkGuide, AppError> {
    sqlx::query_as::<_, ParkGuide>("SELECT * FROM park_guides WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Park guide record not found".to_string()))
}

pub async fn get_park_guides(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<ParkGuide>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list park guides".to_string(),
        ));
    }

    let guides =
        sqlx::query_as::<_, ParkGuide>("SELECT * FROM park_guides ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(guides))
}

pub async fn get_park_guide(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ParkGuide>, AppError> {
    let guide = sqlx::query_as::<_, ParkGuide>("SELECT * FROM park_guides WHERE guide_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Park guide not found".to_string()))?;

    if !auth_user.is_admin() && guide.user_id != auth_user.user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    Ok(Json(guide))
}

pub async fn create_park_guide(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateParkGuideRequest>,
) -> Result<(StatusCode, Json<ParkGuide>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create park guides".to_string(),
        ));
    }

    let guide = sqlx::query_as::<_, ParkGuide>(
        r#"
        INSERT INTO park_guides (user_id, assigned_park_id, certification_status, license_expiry_date)
        VALUES ($1, $2, COALESCE($3, 'not_applicable'), $4)
        RETURNING *
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.assigned_park_id)
    .bind(payload.certification_status)
    .bind(payload.license_expiry_date)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(guide)))
}

pub async fn update_park_guide(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateParkGuideRequest>,
) -> Result<Json<ParkGuide>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update park guides".to_string(),
        ));
    }

    let guide = sqlx::query_as::<_, ParkGuide>(
        r#"
        UPDATE park_guides
        SET assigned_park_id = COALESCE($1, assigned_park_id),
            certification_status = COALESCE($2, certification_status),
            license_expiry_date = COALESCE($3, license_expiry_date),
            updated_at = NOW()
        WHERE guide_id = $4
        RETURNING *
        "#,
    )
    .bind(payload.assigned_park_id)
    .bind(payload.certification_status)
    .bind(payload.license_expiry_date)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Park guide not found".to_string()))?;

    Ok(Json(guide))
}

pub async fn delete_park_guide(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete park guides".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM park_guides WHERE guide_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Park guide not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_own_guide_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<GuideProfileResponse>, AppError> {
    let profile = sqlx::query_as::<_, GuideProfileResponse>(
        r#"
        SELECT pg.guide_id, pg.user_id, u.first_name, u.last_name, u.email,
               pg.certification_status, pg.license_expiry_date,
               pg.assigned_park_id, p.park_name as assigned_park_name
        FROM park_guides pg
        JOIN users u ON pg.user_id = u.user_id
        LEFT JOIN parks p ON pg.assigned_park_id = p.park_id
        WHERE pg.user_id = $1
        "#,
    )
    .bind(auth_user.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Park guide record not found".to_string()))?;

    Ok(Json(profile))
}

pub async fn get_pending_certifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<PendingCertificationRow>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can review certification requests".to_string(),
        ));
    }

    // Empty list, not 404, when nothing is pending
    let guides = sqlx::query_as::<_, PendingCertificationRow>(
        r#"
        SELECT pg.guide_id, pg.user_id, u.first_name, u.last_name, u.email,
               pg.certification_status, pg.requested_park_id,
               p.park_name as requested_park_name
        FROM park_guides pg
        JOIN users u ON pg.user_id = u.user_id
        LEFT JOIN parks p ON pg.requested_park_id = p.park_id
        WHERE pg.certification_status = 'pending'
          AND pg.requested_park_id IS NOT NULL
        ORDER BY pg.updated_at ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(guides))
}

pub async fn get_license_eligibility(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<crate::models::park_guide::EligibilityResponse>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let eligibility_service = EligibilityService::new(state.db.clone());
    let snapshot = eligibility_service.snapshot(&guide).await?;

    Ok(Json(snapshot))
}

pub async fn request_license_approval(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<LicenseApprovalRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let guide = guide_for_user(&state.db, auth_user.user_id).await?;

    let park_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM parks WHERE park_id = $1)",
    )
    .bind(payload.requested_park_id)
    .fetch_one(&state.db)
    .await?;

    if !park_exists {
        return Err(AppError::BadRequest(
            "Requested park does not exist".to_string(),
        ));
    }

    // The server recomputes eligibility; the client's own check is advisory.
    let eligibility_service = EligibilityService::new(state.db.clone());
    let snapshot = eligibility_service.snapshot(&guide).await?;

    if !snapshot.eligible {
        LOGGER.log_business_event(
            "license_request_rejected_ineligible",
            Some(auth_user.user_id),
            [(
                "compulsory_certifications".to_string(),
                serde_json::Value::Number(serde_json::Number::from(
                    snapshot.compulsory_certifications,
                )),
            )]
            .iter()
            .cloned()
            .collect(),
        );
        return Err(AppError::Conflict(format!(
            "Not eligible for a license: status is {:?} with {} of {} compulsory certifications",
            snapshot.certification_status,
            snapshot.compulsory_certifications,
            snapshot.required_certifications
        )));
    }

    sqlx::query(
        r#"
        UPDATE park_guides
        SET certification_status = 'pending', requested_park_id = $1, updated_at = NOW()
        WHERE guide_id = $2
        "#,
    )
    .bind(payload.requested_park_id)
    .bind(guide.guide_id)
    .execute(&state.db)
    .await?;

    LOGGER.log_business_event(
        "license_approval_requested",
        Some(auth_user.user_id),
        [(
            "guide_id".to_string(),
            serde_json::Value::Number(serde_json::Number::from(guide.guide_id)),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(serde_json::json!({
        "message": "License approval request submitted successfully"
    })))
}

pub async fn decide_certification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<CertificationDecisionRequest>,
) -> Result<Json<ParkGuide>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can decide certification requests".to_string(),
        ));
    }

    let guide = sqlx::query_as::<_, ParkGuide>("SELECT * FROM park_guides WHERE guide_id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Park guide not found".to_string()))?;

    if guide.certification_status != crate::models::park_guide::GuideCertificationStatus::Pending {
        return Err(AppError::Conflict(
            "Guide has no pending license request".to_string(),
        ));
    }

    let updated = match payload.decision {
        CertificationDecision::Approved => {
            let expiry = (Utc::now() + Duration::days(365)).date_naive();
            sqlx::query_as::<_, ParkGuide>(
                r#"
                UPDATE park_guides
                SET certification_status = 'certified',
                    license_expiry_date = $1,
                    assigned_park_id = requested_park_id,
                    requested_park_id = NULL,
                    updated_at = NOW()
                WHERE guide_id = $2
                RETURNING *
                "#,
            )
            .bind(expiry)
            .bind(id)
            .fetch_one(&state.db)
            .await?
        }
        CertificationDecision::Rejected => {
            sqlx::query_as::<_, ParkGuide>(
                r#"
                UPDATE park_guides
                SET certification_status = 'not_applicable',
                    requested_park_id = NULL,
                    updated_at = NOW()
                WHERE guide_id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .fetch_one(&state.db)
            .await?
        }
    };

    LOGGER.log_business_event(
        "license_request_decided",
        Some(auth_user.user_id),
        [
            (
                "guide_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(id)),
            ),
            (
                "decision".to_string(),
                serde_json::Value::String(
                    match payload.decision {
                        CertificationDecision::Approved => "approved",
                        CertificationDecision::Rejected => "rejected",
                    }
                    .to_string(),
                ),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(updated))
}
