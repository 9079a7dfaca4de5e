//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use goodvibes_core::error::CoreError;

use super::auth::AuthUser;
use crate::auth::ROLE_MODERATOR;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `moderator` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn moderate(RequireModerator(user): RequireModerator) -> AppResult<StatusCode> {
///     tracing::info!(moderator_id = user.user_id, "moderating");
///     Ok(StatusCode::NO_CONTENT)
/// }
/// ```
pub struct RequireModerator(pub AuthUser);

impl FromRequestParts<AppState> for RequireModerator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_MODERATOR {
            return Err(AppError::Core(CoreError::Forbidden(
                "Moderator role required".into(),
            )));
        }
        Ok(RequireModerator(user))
    }
}
