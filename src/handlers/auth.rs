use axum::{
    extract::{Extension, State},
    response::Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::user::{
        LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, User, UserResponse,
        UserRole, UserStatus,
    },
    utils::{errors::AppError, jwt::create_jwt, logger::LOGGER},
    AppState,
};

const MAX_ATTEMPTS: i32 = 3;
const LOCK_MINUTES: i64 = 5;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::InternalServerError("Failed to hash password".to_string()))?;

    let mut tx = state.db.begin().await?;

    // Accounts start pending and stay locked out of login until an admin
    // approves them.
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, phone_number, role, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING *
        "#,
    )
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.phone_number)
    .bind(payload.role)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("An account with this email already exists".to_string())
        }
        other => AppError::from(other),
    })?;

    if user.role == UserRole::ParkGuide {
        sqlx::query(
            "INSERT INTO park_guides (user_id, certification_status) VALUES ($1, 'not_applicable')",
        )
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    LOGGER.log_business_event(
        "user_registered",
        Some(user.user_id),
        [(
            "role".to_string(),
            serde_json::Value::String(match user.role {
                UserRole::Admin => "admin".to_string(),
                UserRole::ParkGuide => "park_guide".to_string(),
            }),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok((axum::http::StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let now = Utc::now();

    if let Some(locked_until) = user.locked_until {
        if locked_until > now {
            return Err(AppError::TooManyRequests {
                message: "Too many login attempts. Please try again later.".to_string(),
                locked_until: Some(locked_until),
            });
        }
        // Lock has expired; reset the counters before evaluating this attempt
        sqlx::query(
            "UPDATE users SET failed_attempts = 0, last_failed_attempt = NULL, locked_until = NULL
             WHERE user_id = $1",
        )
        .bind(user.user_id)
        .execute(&state.db)
        .await?;
    }

    // Attempt tracking only applies to approved accounts
    match user.status {
        UserStatus::Pending => {
            return Err(AppError::Forbidden(
                "Your account is pending approval.".to_string(),
            ))
        }
        UserStatus::Rejected => {
            return Err(AppError::Forbidden(
                "Your account has been rejected.".to_string(),
            ))
        }
        UserStatus::Approved => {}
    }

    let is_valid = verify(&payload.password, &user.password_hash)
        .map_err(|_| AppError::InternalServerError("Failed to verify password".to_string()))?;

    if !is_valid {
        let next_failed = (user.failed_attempts + 1).min(MAX_ATTEMPTS);
        let lock_triggered = next_failed >= MAX_ATTEMPTS;
        let new_locked_until = lock_triggered.then(|| now + Duration::minutes(LOCK_MINUTES));

        sqlx::query(
            "UPDATE users SET failed_attempts = $1, last_failed_attempt = NOW(), locked_until = $2
             WHERE user_id = $3",
        )
        .bind(next_failed)
        .bind(new_locked_until)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

        if lock_triggered {
            return Err(AppError::TooManyRequests {
                message: "Too many login attempts. Please try again later.".to_string(),
                locked_until: new_locked_until,
            });
        }

        return Err(AppError::Unauthorized(format!(
            "Invalid email or password. {} attempt(s) remaining",
            MAX_ATTEMPTS - next_failed
        )));
    }

    // Successful login resets the attempt tracking
    sqlx::query(
        "UPDATE users SET failed_attempts = 0, last_failed_attempt = NULL, locked_until = NULL
         WHERE user_id = $1",
    )
    .bind(user.user_id)
    .execute(&state.db)
    .await?;

    let role_str = match user.role {
        UserRole::Admin => "admin",
        UserRole::ParkGuide => "park_guide",
    };

    let token = create_jwt(user.user_id, role_str, &state.jwt_secret)
        .map_err(|_| AppError::InternalServerError("Failed to create token".to_string()))?;

    LOGGER.log_business_event(
        "user_logged_in",
        Some(user.user_id),
        std::collections::HashMap::new(),
    );

    Ok(Json(LoginResponse {
        token,
        remaining_attempts: Some(MAX_ATTEMPTS),
        user: UserResponse::from(user),
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(auth_user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET first_name = $1, last_name = $2, phone_number = $3, updated_at = NOW()
        WHERE user_id = $4
        RETURNING *
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.phone_number)
    .bind(auth_user.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
