use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    handlers::training_modules::find_module,
    middleware::auth::AuthUser,
    models::payment::{
        PaymentResponse, PaymentStatus, PaymentTransaction, PurchaseModuleRequest,
        UpdatePaymentStatusRequest,
    },
    services::enrollment::EnrollmentService,
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub async fn get_payment_transactions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can list payment transactions".to_string(),
        ));
    }

    let transactions = sqlx::query_as::<_, PaymentTransaction>(
        "SELECT * FROM payment_transactions ORDER BY transaction_date DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        transactions.into_iter().map(PaymentResponse::from).collect(),
    ))
}

pub async fn get_payment_transaction(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<PaymentResponse>, AppError> {
    let tx = sqlx::query_as::<_, PaymentTransaction>(
        "SELECT * FROM payment_transactions WHERE payment_id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment transaction not found".to_string()))?;

    if !auth_user.is_admin() && tx.user_id != auth_user.user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    Ok(Json(PaymentResponse::from(tx)))
}

pub async fn get_own_payment_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let transactions = sqlx::query_as::<_, PaymentTransaction>(
        "SELECT * FROM payment_transactions WHERE user_id = $1 ORDER BY transaction_date DESC",
    )
    .bind(auth_user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        transactions.into_iter().map(PaymentResponse::from).collect(),
    ))
}

/// Simulated purchase of a paid module. Card details are format-checked and
/// discarded apart from the last four digits; the transaction then waits for
/// admin approval.
pub async fn create_payment_transaction(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<PurchaseModuleRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    payload.validate()?;

    let module = find_module(&state.db, payload.module_id).await?;

    if module.is_free() {
        return Err(AppError::BadRequest(
            "This module is free; use the enroll endpoint".to_string(),
        ));
    }

    if payload.payment_method.requires_card() && payload.card.is_none() {
        return Err(AppError::BadRequest(
            "Card details are required for card payments".to_string(),
        ));
    }

    let enrollment_service = EnrollmentService::new(state.db.clone());

    if enrollment_service
        .owns_module(auth_user.user_id, module.module_id)
        .await?
    {
        return Err(AppError::Conflict(
            "You already own this module".to_string(),
        ));
    }

    if let Some(pending) = enrollment_service
        .latest_purchase(auth_user.user_id, module.module_id)
        .await?
    {
        if pending.payment_status == PaymentStatus::Pending {
            return Err(AppError::Conflict(
                "A payment for this module is already awaiting approval".to_string(),
            ));
        }
    }

    // Compulsory modules come first; electives stay locked until every
    // compulsory module is owned.
    if !module.is_compulsory
        && !enrollment_service
            .owns_all_compulsory(auth_user.user_id)
            .await?
    {
        return Err(AppError::Forbidden(
            "Complete the compulsory modules before purchasing electives".to_string(),
        ));
    }

    let card_last_four = payload.card.as_ref().map(|card| card.last_four());

    let mut tx = state.db.begin().await?;

    let payment = sqlx::query_as::<_, PaymentTransaction>(
        r#"
        INSERT INTO payment_transactions
            (user_id, module_id, payment_purpose, payment_method, amount_paid,
             payment_status, card_last_four, transaction_reference)
        VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
        RETURNING *
        "#,
    )
    .bind(auth_user.user_id)
    .bind(module.module_id)
    .bind(format!("Module Purchase: {}", module.module_name))
    .bind(payload.payment_method)
    .bind(module.price)
    .bind(&card_last_four)
    .bind(Uuid::new_v4())
    .fetch_one(&mut *tx)
    .await?;

    // The purchase row exists immediately but only unlocks the module once
    // the payment is approved.
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

    tx.commit().await?;

    LOGGER.log_business_event(
        "module_purchase_submitted",
        Some(auth_user.user_id),
        [
            (
                "module_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(module.module_id)),
            ),
            (
                "payment_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(payment.payment_id)),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can update payment status".to_string(),
        ));
    }

    if payload.payment_status == PaymentStatus::Pending {
        return Err(AppError::BadRequest(
            "Payment status can only be set to approved or rejected".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    // Blind last-write-wins update; concurrent admin approvals both succeed.
    let payment = sqlx::query_as::<_, PaymentTransaction>(
        "UPDATE payment_transactions SET payment_status = $1 WHERE payment_id = $2 RETURNING *",
    )
    .bind(payload.payment_status)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment transaction not found".to_string()))?;

    match payload.payment_status {
        PaymentStatus::Approved => {
            // Unlock the purchase and start progress tracking for guides
            sqlx::query(
                "UPDATE module_purchases SET status = 'active', is_active = TRUE WHERE payment_id = $1",
            )
            .bind(payment.payment_id)
            .execute(&mut *tx)
            .await?;

            if let Some(module_id) = payment.module_id {
                sqlx::query(
                    r#"
                    INSERT INTO guide_training_progress (guide_id, module_id, status)
                    SELECT pg.guide_id, $2, 'in_progress'
                    FROM park_guides pg
                    WHERE pg.user_id = $1
                    ON CONFLICT (guide_id, module_id) DO NOTHING
                    "#,
                )
                .bind(payment.user_id)
                .bind(module_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        PaymentStatus::Rejected => {
            sqlx::query(
                "UPDATE module_purchases SET status = 'revoked', is_active = FALSE WHERE payment_id = $1",
            )
            .bind(payment.payment_id)
            .execute(&mut *tx)
            .await?;
        }
        PaymentStatus::Pending => unreachable!("rejected above"),
    }

    tx.commit().await?;

    LOGGER.log_business_event(
        "payment_status_updated",
        Some(auth_user.user_id),
        [
            (
                "payment_id".to_string(),
                serde_json::Value::Number(serde_json::Number::from(id)),
            ),
            (
                "status".to_string(),
                serde_json::Value::String(format!("{:?}", payload.payment_status).to_lowercase()),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(PaymentResponse::from(payment)))
}

pub async fn delete_payment_transaction(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can delete payment transactions".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM payment_transactions WHERE payment_id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Payment transaction not found".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
