// HTTP surface for posts.
//
// Purpose
// - Serve the browse, author, and feed listings with the two visibility
//   filters layered on top: circle restrictions and the viewer's shield.
//
// Responsibilities
// - Circle checks bind to the author's circle by name at read time, so
//   membership changes apply to old posts immediately.
// - The shield filters browsing and feeds only. Visiting an author's page is
//   a deliberate act and shows their posts unfiltered.

use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::posts::model::{MAX_POST_LENGTH, Post, blocked_by_shield};
use crate::modules::shields::model::normalize_topic;
use crate::modules::users::model::User;
use crate::shared::auth::{AuthUser, MaybeUser};
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", delete(delete_post))
}

#[derive(Deserialize)]
struct ListPostsQuery {
    author: Option<String>,
    feed: Option<String>,
}

#[derive(Deserialize)]
struct CreatePostBody {
    content: String,
    circle: Option<String>,
    topics: Option<Vec<String>>,
}

async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.as_ref().map(|user| user.id);
    let (posts, shield_applies) = if query.feed.is_some() {
        let viewer_id = viewer_id.ok_or_else(|| {
            ApiError::Unauthorized("You must be logged in to perform this action.".to_string())
        })?;
        let followees: Vec<Uuid> = state
            .follows
            .list_following(viewer_id)
            .await
            .into_iter()
            .map(|follow| follow.followee)
            .collect();
        (state.posts.list_by_authors(&followees).await, true)
    } else if let Some(author) = &query.author {
        let author = resolve_username(&state, author).await?;
        (state.posts.list_by_author(author.id).await, false)
    } else {
        (state.posts.list_all().await, true)
    };

    let shielded = match (shield_applies, viewer_id) {
        (true, Some(viewer_id)) => state
            .shields
            .find_by_owner(viewer_id)
            .await
            .map(|shield| shield.topics)
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::new();
    for post in posts {
        if !circle_allows(&state, &post, viewer_id).await {
            continue;
        }
        if blocked_by_shield(&post.topics, &shielded) {
            continue;
        }
        let author = username_of(&state, &mut names, post.author).await?;
        views.push(post.view(&author));
    }
    Ok(Json(json!({ "posts": views })))
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreatePostBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.content.is_empty() {
        return Err(ApiError::BadRequest(
            "Post content must be at least one character long.".to_string(),
        ));
    }
    if body.content.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::PayloadTooLarge(format!(
            "Post content must be no more than {MAX_POST_LENGTH} characters."
        )));
    }
    if let Some(circle) = &body.circle {
        if state.circles.find(user.id, circle).await.is_none() {
            return Err(ApiError::NotFound(format!(
                "Circle with name {circle} does not exist."
            )));
        }
    }
    let mut topics: Vec<String> = Vec::new();
    for topic in body.topics.unwrap_or_default() {
        let topic = normalize_topic(&topic);
        if !topic.is_empty() && !topics.contains(&topic) {
            topics.push(topic);
        }
    }
    let post = state
        .posts
        .insert(Post::new(user.id, body.content, body.circle, topics))
        .await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your post was created successfully.",
            "post": post.view(&user.username),
        })),
    ))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::NotFound(format!("Post with ID {id} does not exist."));
    let parsed = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let post = state.posts.get(parsed).await.ok_or_else(not_found)?;
    if post.author != user.id {
        return Err(ApiError::Forbidden(
            "Cannot delete other users' posts.".to_string(),
        ));
    }
    state.posts.delete(post.id).await;
    Ok(Json(json!({ "message": "Your post was deleted successfully." })))
}

/// Whether the viewer may see the post under its circle restriction. Authors
/// always see their own posts; a post whose circle has been deleted is
/// visible to nobody else.
async fn circle_allows(state: &AppState, post: &Post, viewer: Option<Uuid>) -> bool {
    let Some(circle) = &post.circle else {
        return true;
    };
    let Some(viewer) = viewer else {
        return false;
    };
    if viewer == post.author {
        return true;
    }
    match state.circles.find(post.author, circle).await {
        Some(circle) => circle.has_member(viewer),
        None => false,
    }
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
        .ok_or_else(|| ApiError::Internal(anyhow!("post references a missing author")))?;
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
