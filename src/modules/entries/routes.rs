// HTTP surface for time entries.
//
// Purpose
// - Validate and resolve incoming payloads, then drive the overlap planner
//   against storage.
//
// Responsibilities
// - Hold the owner's write lock across every check-then-write sequence so
//   concurrent requests cannot interleave their mutations.

use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::categories::model::Category;
use crate::modules::entries::model::Entry;
use crate::modules::entries::overlap::{ReconcileAction, TimeRange, plan};
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/{id}", put(update_entry).delete(delete_entry))
}

#[derive(Deserialize)]
struct ListEntriesQuery {
    category: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

#[derive(Deserialize)]
struct CreateEntryBody {
    category: String,
    start: String,
    end: String,
    tag: Option<String>,
    overwrite: Option<bool>,
}

#[derive(Deserialize)]
struct UpdateEntryBody {
    category: Option<String>,
    start: Option<String>,
    end: Option<String>,
    tag: Option<String>,
}

async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListEntriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = match &query.category {
        Some(name) => Some(resolve_category(&state, user.id, name).await?.id),
        None => None,
    };
    let from = parse_optional_time(query.start_time.as_deref(), "start")?;
    let until = parse_optional_time(query.end_time.as_deref(), "end")?;
    if let (Some(from), Some(until)) = (from, until) {
        if until <= from {
            return Err(ApiError::BadRequest(
                "The time period must have a positive length.".to_string(),
            ));
        }
    }
    let entries = state.entries.list(user.id, category, from, until).await;
    let names = category_names(&state, user.id).await;
    let views = entries
        .iter()
        .map(|entry| Ok(entry.view(&user.username, resolved_name(&names, entry.category)?)))
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(json!({ "entries": views })))
}

async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateEntryBody>,
) -> Result<impl IntoResponse, ApiError> {
    let category = resolve_category(&state, user.id, &body.category).await?;
    let range = parse_range(&body.start, &body.end)?;

    let _guard = state.entry_locks.acquire(user.id).await;
    let conflicts = state
        .entries
        .list(user.id, None, Some(range.start), Some(range.end))
        .await;
    if body.overwrite.unwrap_or(false) {
        apply_plan(&state, range, &conflicts).await?;
    } else if !conflicts.is_empty() {
        return Err(ApiError::Conflict(
            "The time period conflicts with an existing entry.".to_string(),
        ));
    }
    let entry = state
        .entries
        .insert(Entry::new(user.id, category.id, range, body.tag))
        .await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your entry was created successfully.",
            "entry": entry.view(&user.username, &category.name),
        })),
    ))
}

async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateEntryBody>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &id).await?;
    if entry.owner != user.id {
        return Err(ApiError::Forbidden(
            "Cannot modify other users' entries.".to_string(),
        ));
    }
    let category = match &body.category {
        Some(name) => resolve_category(&state, user.id, name).await?,
        None => state
            .categories
            .get(entry.category)
            .await
            .ok_or_else(|| ApiError::Internal(anyhow!("entry references a missing category")))?,
    };
    let start = body.start.unwrap_or_else(|| body_time(entry.start));
    let end = body.end.unwrap_or_else(|| body_time(entry.end));
    let range = parse_range(&start, &end)?;
    let tag = body.tag.or_else(|| entry.tag.clone());

    let _guard = state.entry_locks.acquire(user.id).await;
    let conflicts = state
        .entries
        .list(user.id, None, Some(range.start), Some(range.end))
        .await;
    if conflicts.iter().any(|other| other.id != entry.id) {
        return Err(ApiError::Conflict(
            "The time period conflicts with an existing entry.".to_string(),
        ));
    }
    let updated = state.entries.update(entry.id, category.id, range, tag).await?;
    Ok(Json(json!({
        "message": "Your entry was updated successfully.",
        "entry": updated.view(&user.username, &category.name),
    })))
}

async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &id).await?;
    if entry.owner != user.id {
        return Err(ApiError::Forbidden(
            "Cannot delete other users' entries.".to_string(),
        ));
    }
    let _guard = state.entry_locks.acquire(user.id).await;
    state.entries.delete(entry.id).await;
    Ok(Json(json!({ "message": "Your entry was deleted successfully." })))
}

/// Applies the planner's actions to storage. Split fragments inherit the
/// source entry's category and tag.
async fn apply_plan(
    state: &AppState,
    range: TimeRange,
    conflicts: &[Entry],
) -> Result<(), ApiError> {
    let sources: HashMap<Uuid, &Entry> = conflicts.iter().map(|entry| (entry.id, entry)).collect();
    let actions = plan(range, conflicts);
    if !actions.is_empty() {
        tracing::info!(rewritten = actions.len(), "reconciling overlapping entries");
    }
    for action in actions {
        match action {
            ReconcileAction::Remove { id } => {
                state.entries.delete(id).await;
            }
            ReconcileAction::Resize { id, range } => {
                state.entries.resize(id, range).await.map_err(anyhow::Error::new)?;
            }
            ReconcileAction::Split { id, head, tail } => {
                let source = sources
                    .get(&id)
                    .ok_or_else(|| ApiError::Internal(anyhow!("split targets an unknown entry")))?;
                state.entries.resize(id, head).await.map_err(anyhow::Error::new)?;
                state
                    .entries
                    .insert(Entry::new(source.owner, source.category, tail, source.tag.clone()))
                    .await;
            }
        }
    }
    Ok(())
}

async fn resolve_category(
    state: &AppState,
    owner: Uuid,
    name: &str,
) -> Result<Category, ApiError> {
    state
        .categories
        .find_by_name(owner, name)
        .await
        .ok_or_else(|| ApiError::NotFound("Must provide a valid category.".to_string()))
}

async fn resolve_entry(state: &AppState, id: &str) -> Result<Entry, ApiError> {
    let not_found = || ApiError::NotFound(format!("Entry with ID {id} does not exist."));
    let parsed = Uuid::parse_str(id).map_err(|_| not_found())?;
    state.entries.get(parsed).await.ok_or_else(not_found)
}

async fn category_names(state: &AppState, owner: Uuid) -> HashMap<Uuid, String> {
    state
        .categories
        .list_by_owner(owner)
        .await
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect()
}

fn resolved_name(names: &HashMap<Uuid, String>, id: Uuid) -> Result<&str, ApiError> {
    names
        .get(&id)
        .map(String::as_str)
        .ok_or_else(|| ApiError::Internal(anyhow!("entry references a missing category")))
}

fn parse_range(start: &str, end: &str) -> Result<TimeRange, ApiError> {
    let start = parse_time(start, "start")?;
    let end = parse_time(end, "end")?;
    if end <= start {
        return Err(ApiError::BadRequest(
            "The time period must have a positive length.".to_string(),
        ));
    }
    Ok(TimeRange { start, end })
}

fn parse_time(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| ApiError::BadRequest(format!("Must provide a valid {field} time.")))
}

fn parse_optional_time(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.map(|raw| parse_time(raw, field)).transpose()
}

fn body_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}
