// HTTP surface for weekly goals.
//
// Purpose
// - Serve goal CRUD plus the progress figure for the running week.
//
// Responsibilities
// - Enforce the visibility rules: private goals stay between the owner and
//   nobody else, public goals are shared with friends.

use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::modules::goals::model::{Goal, GoalKind, GoalView};
use crate::modules::goals::progress::{logged_hours, week_start};
use crate::modules::users::model::User;
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/{id}", put(update_goal).delete(delete_goal))
}

#[derive(Deserialize)]
struct ListGoalsQuery {
    author: Option<String>,
    feed: Option<String>,
}

#[derive(Deserialize)]
struct CreateGoalBody {
    category: String,
    hours: f64,
    kind: String,
    private: Option<bool>,
}

#[derive(Deserialize)]
struct UpdateGoalBody {
    hours: Option<f64>,
    kind: Option<String>,
    private: Option<bool>,
}

async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListGoalsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let goals = if query.feed.is_some() {
        let friends = friend_ids(&state, user.id).await;
        state
            .goals
            .list_by_owners(&friends)
            .await
            .into_iter()
            .filter(|goal| !goal.private)
            .collect()
    } else if let Some(author) = &query.author {
        let author = resolve_username(&state, author).await?;
        if author.id == user.id {
            state.goals.list_by_owner(author.id).await
        } else if state.friends.find_friendship(user.id, author.id).await.is_some() {
            state
                .goals
                .list_by_owner(author.id)
                .await
                .into_iter()
                .filter(|goal| !goal.private)
                .collect()
        } else {
            return Err(ApiError::Forbidden(format!(
                "You must be friends with {} to view their goals.",
                author.username
            )));
        }
    } else {
        state.goals.list_by_owner(user.id).await
    };
    let views = goal_views(&state, goals).await?;
    Ok(Json(json!({ "goals": views })))
}

async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateGoalBody>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .find_by_name(user.id, &body.category)
        .await
        .ok_or_else(|| ApiError::NotFound("Must provide a valid category.".to_string()))?;
    require_positive_hours(body.hours)?;
    let kind = parse_kind(&body.kind)?;
    let goal = state
        .goals
        .insert(Goal::new(
            user.id,
            category.id,
            body.hours,
            kind,
            body.private.unwrap_or(false),
        ))
        .await
        .map_err(|_| {
            ApiError::Conflict("You already have a goal for this category.".to_string())
        })?;
    let progress = progress_for(&state, &goal).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your goal was created successfully.",
            "goal": goal.view(&user.username, &category.name, progress),
        })),
    ))
}

async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateGoalBody>,
) -> Result<impl IntoResponse, ApiError> {
    let goal = resolve_goal(&state, &id).await?;
    if goal.owner != user.id {
        return Err(ApiError::Forbidden(
            "Cannot modify other users' goals.".to_string(),
        ));
    }
    if let Some(hours) = body.hours {
        require_positive_hours(hours)?;
    }
    let kind = body.kind.as_deref().map(parse_kind).transpose()?;
    let updated = state
        .goals
        .update(goal.id, body.hours, kind, body.private)
        .await?;
    let views = goal_views(&state, vec![updated]).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal(anyhow!("updated goal produced no view")))?;
    Ok(Json(json!({
        "message": "Your goal was updated successfully.",
        "goal": view,
    })))
}

async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let goal = resolve_goal(&state, &id).await?;
    if goal.owner != user.id {
        return Err(ApiError::Forbidden(
            "Cannot delete other users' goals.".to_string(),
        ));
    }
    state.goals.delete(goal.id).await;
    Ok(Json(json!({ "message": "Your goal was deleted successfully." })))
}

/// Resolves author and category names and computes this week's progress for
/// each goal.
async fn goal_views(state: &AppState, goals: Vec<Goal>) -> Result<Vec<GoalView>, ApiError> {
    let mut views = Vec::with_capacity(goals.len());
    for goal in goals {
        let author = state
            .users
            .get(goal.owner)
            .await
            .ok_or_else(|| ApiError::Internal(anyhow!("goal owned by a missing user")))?;
        let category = state
            .categories
            .get(goal.category)
            .await
            .ok_or_else(|| ApiError::Internal(anyhow!("goal references a missing category")))?;
        let progress = progress_for(state, &goal).await;
        views.push(goal.view(&author.username, &category.name, progress));
    }
    Ok(views)
}

async fn progress_for(state: &AppState, goal: &Goal) -> f64 {
    let start = week_start(Local::now()).with_timezone(&Utc);
    let entries = state
        .entries
        .list(goal.owner, Some(goal.category), Some(start), None)
        .await;
    logged_hours(&entries, start)
}

async fn friend_ids(state: &AppState, user: Uuid) -> Vec<Uuid> {
    state
        .friends
        .list_friendships(user)
        .await
        .into_iter()
        .map(|friendship| friendship.other(user))
        .collect()
}

async fn resolve_username(state: &AppState, username: &str) -> Result<User, ApiError> {
    state
        .users
        .find_by_username(username)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("User {username} does not exist.")))
}

async fn resolve_goal(state: &AppState, id: &str) -> Result<Goal, ApiError> {
    let not_found = || ApiError::NotFound(format!("Goal with ID {id} does not exist."));
    let parsed = Uuid::parse_str(id).map_err(|_| not_found())?;
    state.goals.get(parsed).await.ok_or_else(not_found)
}

fn require_positive_hours(hours: f64) -> Result<(), ApiError> {
    if hours.is_finite() && hours > 0.0 {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Hours must be a positive number.".to_string(),
        ))
    }
}

fn parse_kind(raw: &str) -> Result<GoalKind, ApiError> {
    GoalKind::parse(raw).ok_or_else(|| {
        ApiError::BadRequest("Goal kind must be either 'goal' or 'budget'.".to_string())
    })
}
