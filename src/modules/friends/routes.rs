// HTTP surface for friendships.
//
// Purpose
// - Drive the request/accept lifecycle: requests are directional, friendships
//   are symmetric, and at most one relation exists between any two users.

use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::friends::model::{FriendRequest, FriendStatus, Friendship};
use crate::modules::users::model::User;
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_friendships))
        .route("/requests", get(list_requests))
        .route("/status/{username}", get(friend_status))
        .route(
            "/requests/{username}",
            put(send_request).delete(withdraw_request),
        )
        .route("/requests/{username}/respond", post(respond_to_request))
        .route("/{username}", delete(unfriend))
}

#[derive(Deserialize)]
struct RespondBody {
    response: String,
}

async fn list_friendships(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let friendships = state.friends.list_friendships(user.id).await;
    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::with_capacity(friendships.len());
    for friendship in &friendships {
        let first = username_of(&state, &mut names, friendship.users[0]).await?;
        let second = username_of(&state, &mut names, friendship.users[1]).await?;
        views.push(friendship.view([first, second]));
    }
    Ok(Json(json!({ "friendships": views })))
}

async fn list_requests(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state.friends.list_requests(user.id).await;
    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::with_capacity(requests.len());
    for request in &requests {
        let requester = username_of(&state, &mut names, request.requester).await?;
        let requestee = username_of(&state, &mut names, request.requestee).await?;
        views.push(request.view(&requester, &requestee));
    }
    Ok(Json(json!({ "requests": views })))
}

async fn friend_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let other = resolve_username(&state, &username).await?;
    let status = if state
        .friends
        .find_friendship(user.id, other.id)
        .await
        .is_some()
    {
        FriendStatus::Friends
    } else if state.friends.find_request(user.id, other.id).await.is_some() {
        FriendStatus::RequestSent
    } else if state.friends.find_request(other.id, user.id).await.is_some() {
        FriendStatus::RequestReceived
    } else {
        FriendStatus::None
    };
    Ok(Json(json!({ "status": status })))
}

async fn send_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requestee = resolve_username(&state, &username).await?;
    if requestee.id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot friend yourself.".to_string(),
        ));
    }
    if state
        .friends
        .find_friendship(user.id, requestee.id)
        .await
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "You are already friends with {}.",
            requestee.username
        )));
    }
    let request = state
        .friends
        .insert_request(FriendRequest::new(user.id, requestee.id))
        .await
        .map_err(|_| {
            ApiError::Conflict(format!(
                "There is already a pending friend request between you and {}.",
                requestee.username
            ))
        })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("You sent a friend request to {}.", requestee.username),
            "request": request.view(&user.username, &requestee.username),
        })),
    ))
}

async fn withdraw_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requestee = resolve_username(&state, &username).await?;
    if !state.friends.delete_request(user.id, requestee.id).await {
        return Err(ApiError::NotFound(format!(
            "You do not have a pending friend request to {}.",
            requestee.username
        )));
    }
    Ok(Json(json!({
        "message": format!("You withdrew your friend request to {}.", requestee.username),
    })))
}

async fn respond_to_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
    Json(body): Json<RespondBody>,
) -> Result<impl IntoResponse, ApiError> {
    let accept = match body.response.as_str() {
        "accept" => true,
        "reject" => false,
        _ => {
            return Err(ApiError::BadRequest(
                "Response must be either 'accept' or 'reject'.".to_string(),
            ));
        }
    };
    let requester = resolve_username(&state, &username).await?;
    if !state.friends.delete_request(requester.id, user.id).await {
        return Err(ApiError::NotFound(format!(
            "You do not have a pending friend request from {}.",
            requester.username
        )));
    }
    if accept {
        state
            .friends
            .insert_friendship(Friendship::new(user.id, requester.id))
            .await
            .map_err(|_| {
                ApiError::Conflict(format!(
                    "You are already friends with {}.",
                    requester.username
                ))
            })?;
    }
    let verdict = if accept { "accepted" } else { "rejected" };
    Ok(Json(json!({
        "message": format!(
            "You {verdict} a friend request from {}.",
            requester.username
        ),
    })))
}

async fn unfriend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let other = resolve_username(&state, &username).await?;
    if !state.friends.delete_friendship(user.id, other.id).await {
        return Err(ApiError::NotFound(format!(
            "You are not friends with {}.",
            other.username
        )));
    }
    Ok(Json(json!({
        "message": format!("You are no longer friends with {}.", other.username),
    })))
}

async fn username_of(
    state: &AppState,
    names: &mut HashMap<Uuid, String>,
    id: Uuid,
) -> Result<String, ApiError> {
    if let Some(name) = names.get(&id) {
        return Ok(name.clone());
    }
    let user = state
        .users
        .get(id)
        .await
        .ok_or_else(|| ApiError::Internal(anyhow!("relation references a missing user")))?;
    names.insert(id, user.username.clone());
    Ok(user.username)
}

async fn resolve_username(state: &AppState, username: &str) -> Result<User, ApiError> {
    state
        .users
        .find_by_username(username)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("User {username} does not exist.")))
}
