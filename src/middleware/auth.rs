use crate::{
    models::user::{UserRole, UserStatus},
    utils::jwt::verify_jwt,
    AppState,
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

#[derive(Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn is_park_guide(&self) -> bool {
        matches!(self.role, UserRole::ParkGuide)
    }

    pub fn role_str(&self) -> &'static str {
        match self.role {
            UserRole::Admin => "admin",
            UserRole::ParkGuide => "park_guide",
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = &auth_header[7..];

    let claims = verify_jwt(token, &state.jwt_secret).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Re-check role and approval against the database on every request, so a
    // rejected or demoted account loses access before its token expires.
    let row = sqlx::query_as::<_, (UserRole, UserStatus)>(
        "SELECT role, status FROM users WHERE user_id = $1",
    )
    .bind(claims.sub)
    .fetch_optional(&state.db)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (role, status) = row.ok_or(StatusCode::UNAUTHORIZED)?;

    if status != UserStatus::Approved {
        return Err(StatusCode::FORBIDDEN);
    }

    let auth_user = AuthUser {
        user_id: claims.sub,
        role,
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
