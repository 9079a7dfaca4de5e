//! Handlers for the `/auth` resource (login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use goodvibes_core::auth::Session;
use goodvibes_core::error::CoreError;
use goodvibes_db::repositories::ModeratorRepo;
use serde::Deserialize;
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::auth::ROLE_MODERATOR;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
pub const LOCK_DURATION_MINS: i64 = 15;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid email or password".into(),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate a moderator with email + password and return a session
/// carrying a signed access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<Session>> {
    input.validate()?;
    let email = input.email.trim().to_lowercase();

    // 1. Find the account.
    let moderator = ModeratorRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // 2. Refuse while temporarily locked.
    if moderator.is_locked(Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    // 3. Verify password.
    let password_valid = verify_password(&input.password, &moderator.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 4. On failure: increment counter, lock once the threshold is hit.
        ModeratorRepo::increment_failed_login(&state.pool, moderator.id).await?;

        let new_count = moderator.failed_login_count + 1;
        if new_count >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            ModeratorRepo::lock_account(&state.pool, moderator.id, lock_until).await?;
            tracing::warn!(moderator_id = moderator.id, "Moderator account locked");
        }

        return Err(invalid_credentials());
    }

    // 5. On success: reset the counter and stamp the login.
    ModeratorRepo::record_successful_login(&state.pool, moderator.id).await?;

    let issued = generate_access_token(moderator.id, &moderator.email, ROLE_MODERATOR, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(moderator_id = moderator.id, "Moderator logged in");
    Ok(Json(Session {
        access_token: issued.token,
        email: moderator.email,
        expires_at: issued.expires_at,
    }))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless, so this only records the sign-out. Returns 204.
pub async fn logout(auth_user: AuthUser) -> AppResult<StatusCode> {
    tracing::info!(moderator_id = auth_user.user_id, "Moderator logged out");
    Ok(StatusCode::NO_CONTENT)
}
