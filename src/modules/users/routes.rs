use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::modules::users::model::{Session, User, valid_password, valid_username};
use crate::modules::users::password;
use crate::shared::auth::{
    AuthUser, MaybeUser, expired_session_cookie, session_cookie, session_token,
};
use crate::shared::error::ApiError;
use crate::shared::infrastructure::memory::StoreError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(register).patch(update_profile).delete(delete_account),
        )
        .route("/session", get(current_session).post(login).delete(logout))
}

#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct UpdateProfileBody {
    username: Option<String>,
    password: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, ApiError> {
    if viewer.is_some() {
        return Err(ApiError::Forbidden("You are already signed in.".to_string()));
    }
    require_valid_username(&body.username)?;
    require_valid_password(&body.password)?;
    let user = state
        .users
        .insert(User::new(body.username, password::hash(&body.password)))
        .await
        .map_err(|_| {
            ApiError::Conflict("An account with this username already exists.".to_string())
        })?;
    state.shields.ensure(user.id).await;
    let session = state.sessions.insert(Session::new(user.id)).await;
    tracing::info!(username = %user.username, "account created");
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(session.token))],
        Json(json!({
            "message": "Your account was created successfully.",
            "user": user.view(),
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, ApiError> {
    if viewer.is_some() {
        return Err(ApiError::Forbidden("You are already signed in.".to_string()));
    }
    let user = match state.users.find_by_username(&body.username).await {
        Some(user) if password::verify(&body.password, &user.password_hash) => user,
        _ => {
            tracing::warn!(username = %body.username, "failed login attempt");
            return Err(ApiError::Unauthorized(
                "Invalid username or password.".to_string(),
            ));
        }
    };
    let session = state.sessions.insert(Session::new(user.id)).await;
    Ok((
        [(header::SET_COOKIE, session_cookie(session.token))],
        Json(json!({
            "message": "You have logged in successfully.",
            "user": user.view(),
        })),
    ))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    AuthUser(_user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.delete(token).await;
    }
    Ok((
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "message": "You have been logged out successfully." })),
    ))
}

async fn current_session(MaybeUser(viewer): MaybeUser) -> Json<serde_json::Value> {
    Json(json!({ "user": viewer.map(|user| user.view()) }))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(username) = &body.username {
        require_valid_username(username)?;
    }
    if let Some(new_password) = &body.password {
        require_valid_password(new_password)?;
    }
    let updated = state
        .users
        .update(
            user.id,
            body.username,
            body.password.map(|raw| password::hash(&raw)),
        )
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => {
                ApiError::Conflict("An account with this username already exists.".to_string())
            }
            StoreError::NotFound => ApiError::from(err),
        })?;
    Ok(Json(json!({
        "message": "Your profile was updated successfully.",
        "user": updated.view(),
    })))
}

async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    {
        let _guard = state.entry_locks.acquire(user.id).await;
        state.sessions.delete_for_user(user.id).await;
        state.posts.delete_by_author(user.id).await;
        state.entries.delete_by_owner(user.id).await;
        state.goals.delete_by_owner(user.id).await;
        state.categories.delete_by_owner(user.id).await;
        state.follows.delete_by_user(user.id).await;
        state.friends.delete_by_user(user.id).await;
        state.circles.delete_by_owner(user.id).await;
        state.circles.remove_member_everywhere(user.id).await;
        state.shields.delete_by_owner(user.id).await;
        state.users.delete(user.id).await;
    }
    // The owner is gone, so their write lock can go with them.
    state.entry_locks.discard(user.id).await;
    tracing::info!(username = %user.username, "account deleted");
    Ok((
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "message": "Your account has been deleted successfully." })),
    ))
}

fn require_valid_username(username: &str) -> Result<(), ApiError> {
    if valid_username(username) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username must be a nonempty string of letters, numbers, and underscores.".to_string(),
        ))
    }
}

fn require_valid_password(password: &str) -> Result<(), ApiError> {
    if valid_password(password) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Password must be a nonempty string without whitespace.".to_string(),
        ))
    }
}

#[cfg(test)]
mod user_routes_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::tests::fixtures::{app, body_json, request, send, session_cookie_from, signup};

    #[tokio::test]
    async fn it_should_register_an_account_and_open_a_session() {
        let app = app();
        let response = send(
            &app,
            request(
                "POST",
                "/api/users",
                None,
                Some(&json!({ "username": "ada", "password": "hunter2" })),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = session_cookie_from(&response);
        let body = body_json(response).await;
        assert_eq!(body["user"]["username"], "ada");
        assert!(body["user"].get("password_hash").is_none());

        let session = send(&app, request("GET", "/api/users/session", Some(&cookie), None)).await;
        let body = body_json(session).await;
        assert_eq!(body["user"]["username"], "ada");
    }

    #[tokio::test]
    async fn it_should_reject_a_duplicate_username_ignoring_case() {
        let app = app();
        signup(&app, "ada").await;
        let response = send(
            &app,
            request(
                "POST",
                "/api/users",
                None,
                Some(&json!({ "username": "Ada", "password": "hunter2" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn it_should_reject_malformed_credentials() {
        let app = app();
        for (username, password) in [("ada lovelace", "hunter2"), ("ada", "has space"), ("", "x")] {
            let response = send(
                &app,
                request(
                    "POST",
                    "/api/users",
                    None,
                    Some(&json!({ "username": username, "password": password })),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn it_should_refuse_registering_while_signed_in() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        let response = send(
            &app,
            request(
                "POST",
                "/api/users",
                Some(&cookie),
                Some(&json!({ "username": "grace", "password": "hunter2" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn it_should_log_in_with_the_right_password_only() {
        let app = app();
        signup(&app, "ada").await;

        let wrong = send(
            &app,
            request(
                "POST",
                "/api/users/session",
                None,
                Some(&json!({ "username": "ada", "password": "wrong" })),
            ),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let right = send(
            &app,
            request(
                "POST",
                "/api/users/session",
                None,
                Some(&json!({ "username": "ada", "password": "correct-horse" })),
            ),
        )
        .await;
        assert_eq!(right.status(), StatusCode::OK);
        let body = body_json(right).await;
        assert_eq!(body["user"]["username"], "ada");
    }

    #[tokio::test]
    async fn it_should_end_the_session_on_logout() {
        let app = app();
        let cookie = signup(&app, "ada").await;

        let logout = send(
            &app,
            request("DELETE", "/api/users/session", Some(&cookie), None),
        )
        .await;
        assert_eq!(logout.status(), StatusCode::OK);

        let session = send(&app, request("GET", "/api/users/session", Some(&cookie), None)).await;
        let body = body_json(session).await;
        assert!(body["user"].is_null());
    }

    #[tokio::test]
    async fn it_should_rename_an_account() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        let response = send(
            &app,
            request(
                "PATCH",
                "/api/users",
                Some(&cookie),
                Some(&json!({ "username": "lovelace" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["username"], "lovelace");
    }

    #[tokio::test]
    async fn it_should_refuse_renaming_onto_a_taken_username() {
        let app = app();
        signup(&app, "grace").await;
        let cookie = signup(&app, "ada").await;
        let response = send(
            &app,
            request(
                "PATCH",
                "/api/users",
                Some(&cookie),
                Some(&json!({ "username": "grace" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn it_should_delete_the_account_and_its_session() {
        let app = app();
        let cookie = signup(&app, "ada").await;

        let response = send(&app, request("DELETE", "/api/users", Some(&cookie), None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let login = send(
            &app,
            request(
                "POST",
                "/api/users/session",
                None,
                Some(&json!({ "username": "ada", "password": "correct-horse" })),
            ),
        )
        .await;
        assert_eq!(login.status(), StatusCode::UNAUTHORIZED);

        let session = send(&app, request("GET", "/api/users/session", Some(&cookie), None)).await;
        let body = body_json(session).await;
        assert!(body["user"].is_null());
    }

    #[tokio::test]
    async fn it_should_require_a_session_for_profile_changes() {
        let app = app();
        let response = send(
            &app,
            request(
                "PATCH",
                "/api/users",
                None,
                Some(&json!({ "username": "ghost" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
