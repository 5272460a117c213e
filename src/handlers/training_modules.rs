use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::{
        payment::PaymentTransaction,
        training_module::{
            CreateTrainingModuleRequest, ModuleAccessResponse, PurchaseStatusResponse,
            TrainingModule, UpdateTrainingModuleRequest,
        },
    },
    services::enrollment::EnrollmentService,
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub(crate) async fn find_module(
    db: &sqlx::PgPool,
    module_id: i32,
) -> Result<TrainingModule, AppError> {
    sqlx::query_as::<_, TrainingModule>("SELECT * FROM training_modules WHERE module_id = $1")
        .bind(module_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Training module not found".to_string()))
}

pub async fn get_training_modules(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrainingModule>>, AppError> {
    let modules = sqlx::query_as::<_, TrainingModule>(
        "SELECT * FROM training_modules ORDER BY is_compulsory DESC, module_name ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(modules))
}

pub async fn get_training_module(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TrainingModule>, AppError> {
    let module = find_module(&state.db, id).await?;
    Ok(Json(module))
}

pub async fn create_training_module(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateTrainingModuleRequest>,
) -> Result<(StatusCode, Json<TrainingModule>), AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create training modules".to_string(),
        ));
    }

    payload.validate()?;

    let module = sqlx::query_as::<_, TrainingModule>(
        r#"
        INSERT INTO training_modules
            (module_name, description, price, is_compulsory, video_url, course_content)
        VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, FALSE), $5, $6)
        RETURNING *
        "#,
    )
    .bind(&payload.module_name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.is_compulsory)
    .bind(&payload.video_url)
    .bind(&payload.course_content)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn update_training_module(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTrainingModuleRequest>,
) -> Result<Json<TrainingModule>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update training modules".to_string(),
        ));
    }

    payload.validate()?;

    let module = sqlx::query_as::<_, TrainingModule>(
        r#"
        UPDATE training_modules
        SET module_name = COALESCE($1, module_name),
            description = COALESCE($2, description),
            price = COALESCE($3, price),
            is_compulsory = COALESCE($4, is_compulsory),
            video_url = COALESCE($5, video_url),
            course_content = COALESCE($6, course_content),
            updated_at = NOW()
        WHERE module_id = $7
        RETURNING *
        "#,
    )
    .bind(&payload.module_name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.is_compulsory)
    .bind(&payload.video_url)
    .bind(&payload.course_content)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Training module not found".to_string()))?;

    Ok(Json(module))
}

pub async fn delete_training_module(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete training modules".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM training_modules WHERE module_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Training module not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Direct enrollment for free modules. Paid modules go through the payment
/// flow instead.
pub async fn enroll_free_module(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let module = find_module(&state.db, id).await?;

    if !module.is_free() {
        return Err(AppError::BadRequest(
            "This is a premium module and requires payment".to_string(),
        ));
    }

    let enrollment_service = EnrollmentService::new(state.db.clone());
    if enrollment_service
        .owns_module(auth_user.user_id, module.module_id)
        .await?
    {
        return Ok(Json(serde_json::json!({
            "message": "You are already enrolled in this module",
            "module_id": module.module_id,
            "status": "active",
        })));
    }

    let mut tx = state.db.begin().await?;

    // Free enrollments still get a zero-amount approved transaction so the
    // ownership checks have a single shape to look at.
    let payment = sqlx::query_as::<_, PaymentTransaction>(
        r#"
        INSERT INTO payment_transactions
            (user_id, module_id, payment_purpose, payment_method, amount_paid,
             payment_status, transaction_reference)
        VALUES ($1, $2, $3, 'ewallet', 0, 'approved', $4)
        RETURNING *
        "#,
    )
    .bind(auth_user.user_id)
    .bind(module.module_id)
    .bind(format!("Free Module: {}", module.module_name))
    .bind(Uuid::new_v4())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO module_purchases (user_id, module_id, payment_id, status, is_active)
        VALUES ($1, $2, $3, 'active', TRUE)
        "#,
    )
    .bind(auth_user.user_id)
    .bind(module.module_id)
    .bind(payment.payment_id)
    .execute(&mut *tx)
    .await?;

    // Track training progress when the account has a guide record
    sqlx::query(
        r#"
        INSERT INTO guide_training_progress (guide_id, module_id, status)
        SELECT pg.guide_id, $2, 'in_progress'
        FROM park_guides pg
        WHERE pg.user_id = $1
        ON CONFLICT (guide_id, module_id) DO NOTHING
        "#,
    )
    .bind(auth_user.user_id)
    .bind(module.module_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    LOGGER.log_business_event(
        "free_module_enrolled",
        Some(auth_user.user_id),
        [(
            "module_id".to_string(),
            serde_json::Value::Number(serde_json::Number::from(module.module_id)),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(serde_json::json!({
        "message": "Successfully enrolled in free module",
        "module_id": module.module_id,
        "status": "active",
    })))
}

pub async fn check_module_access(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ModuleAccessResponse>, AppError> {
    let module = find_module(&state.db, id).await?;

    let enrollment_service = EnrollmentService::new(state.db.clone());
    let access = enrollment_service
        .module_access(auth_user.user_id, &module)
        .await?;

    Ok(Json(ModuleAccessResponse {
        has_access: access.has_access(),
        reason: access.reason().to_string(),
    }))
}

pub async fn check_purchase_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<PurchaseStatusResponse>, AppError> {
    let module = find_module(&state.db, id).await?;

    if module.is_free() {
        return Ok(Json(PurchaseStatusResponse {
            status: "free".to_string(),
            module,
            payment_id: None,
            purchase_date: None,
        }));
    }

    let enrollment_service = EnrollmentService::new(state.db.clone());
    let Some(purchase) = enrollment_service
        .latest_purchase(auth_user.user_id, module.module_id)
        .await?
    else {
        return Ok(Json(PurchaseStatusResponse {
            status: "not_purchased".to_string(),
            module,
            payment_id: None,
            purchase_date: None,
        }));
    };

    use crate::models::payment::PaymentStatus;
    use crate::models::purchase::PurchaseStatus;

    let status = match (purchase.payment_status, purchase.status) {
        (PaymentStatus::Pending, _) => "payment_pending",
        (PaymentStatus::Rejected, _) => "payment_rejected",
        (PaymentStatus::Approved, PurchaseStatus::Active) => "active",
        (PaymentStatus::Approved, PurchaseStatus::Revoked) => "revoked",
    };

    Ok(Json(PurchaseStatusResponse {
        status: status.to_string(),
        module,
        payment_id: Some(purchase.payment_id),
        purchase_date: Some(purchase.purchase_date),
    }))
}
