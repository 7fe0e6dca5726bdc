use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::follows::model::{Follow, FollowView};
use crate::modules::users::model::User;
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_follows).post(create_follow))
        .route("/{username}", delete(delete_follow))
}

#[derive(Deserialize)]
struct ListFollowsQuery {
    follower: Option<String>,
    followee: Option<String>,
}

#[derive(Deserialize)]
struct FollowBody {
    username: Option<String>,
}

async fn list_follows(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ListFollowsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let follower = match &query.follower {
        Some(username) => Some(resolve_username(&state, username).await?),
        None => None,
    };
    let followee = match &query.followee {
        Some(username) => Some(resolve_username(&state, username).await?),
        None => None,
    };
    let follows = match (&follower, &followee) {
        (None, None) => {
            return Err(ApiError::BadRequest(
                "You may not request follows without a specific follower and/or followee."
                    .to_string(),
            ));
        }
        (Some(follower), Some(followee)) => state
            .follows
            .find(follower.id, followee.id)
            .await
            .into_iter()
            .collect(),
        (Some(follower), None) => state.follows.list_following(follower.id).await,
        (None, Some(followee)) => state.follows.list_followers(followee.id).await,
    };
    let views = follow_views(&state, &follows).await?;
    Ok(Json(json!({ "follows": views })))
}

async fn create_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<FollowBody>,
) -> Result<impl IntoResponse, ApiError> {
    let username = body
        .username
        .ok_or_else(|| ApiError::BadRequest("Missing username to follow.".to_string()))?;
    let followee = resolve_username(&state, &username).await?;
    if followee.id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot follow yourself.".to_string(),
        ));
    }
    let follow = state
        .follows
        .insert(Follow::new(user.id, followee.id))
        .await
        .map_err(|_| {
            ApiError::Conflict("You are already following this user.".to_string())
        })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("You are now following {}.", followee.username),
            "follow": follow.view(&user.username, &followee.username),
        })),
    ))
}

async fn delete_follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let followee = resolve_username(&state, &username).await?;
    state.follows.delete(user.id, followee.id).await;
    // Circle membership requires following the owner, so an unfollow also
    // drops the follower from the followee's circles.
    state.circles.remove_member(followee.id, user.id).await;
    Ok(Json(json!({
        "message": format!("You are no longer following {}.", followee.username),
    })))
}

async fn follow_views(state: &AppState, follows: &[Follow]) -> Result<Vec<FollowView>, ApiError> {
    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::with_capacity(follows.len());
    for follow in follows {
        let follower = username_of(state, &mut names, follow.follower).await?;
        let followee = username_of(state, &mut names, follow.followee).await?;
        views.push(follow.view(&follower, &followee));
    }
    Ok(views)
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
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("follow references a missing user")))?;
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
