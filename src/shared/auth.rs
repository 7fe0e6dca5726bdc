// Cookie session auth for route handlers.
//
// Purpose
// - Resolve the session cookie into the logged in user before handlers run.
//
// Responsibilities
// - Reject requests without a live session where a login is required.
// - Keep the cookie format in one place.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use uuid::Uuid;

use crate::modules::users::model::User;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub const SESSION_COOKIE: &str = "tempo_session";

/// Extractor for routes that require a logged in user.
pub struct AuthUser(pub User);

/// Extractor for routes that also serve visitors.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(&parts.headers, state).await {
            Some(user) => Ok(AuthUser(user)),
            None => Err(ApiError::Unauthorized(
                "You must be logged in to perform this action.".to_string(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(&parts.headers, state).await))
    }
}

async fn resolve_user(headers: &HeaderMap, state: &AppState) -> Option<User> {
    let token = session_token(headers)?;
    let session = state.sessions.get(token).await?;
    // The account may have been deleted while the cookie was still out there.
    state.users.get(session.user_id).await
}

pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

pub fn session_cookie(token: Uuid) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
