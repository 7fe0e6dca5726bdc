use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::modules::categories::model::{Category, valid_category_name};
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", put(rename_category).delete(delete_category))
}

#[derive(Deserialize)]
struct CategoryBody {
    name: String,
}

async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<serde_json::Value> {
    let categories: Vec<_> = state
        .categories
        .list_by_owner(user.id)
        .await
        .into_iter()
        .map(|category| category.view())
        .collect();
    Json(json!({ "categories": categories }))
}

async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CategoryBody>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_category_name(&body.name) {
        return Err(ApiError::BadRequest(
            "Category name must be at least one character long.".to_string(),
        ));
    }
    let category = state
        .categories
        .insert(Category::new(user.id, body.name))
        .await
        .map_err(|_| {
            ApiError::Conflict("You already have a category with this name.".to_string())
        })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your category was created successfully.",
            "category": category.view(),
        })),
    ))
}

async fn rename_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CategoryBody>,
) -> Result<impl IntoResponse, ApiError> {
    let category = resolve_owned(&state, user.id, &id).await?;
    if !valid_category_name(&body.name) {
        return Err(ApiError::BadRequest(
            "Category name must be at least one character long.".to_string(),
        ));
    }
    let renamed = state
        .categories
        .rename(category.id, user.id, body.name)
        .await
        .map_err(|_| {
            ApiError::Conflict("You already have a category with this name.".to_string())
        })?;
    Ok(Json(json!({
        "message": "Your category was renamed successfully.",
        "category": renamed.view(),
    })))
}

async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = resolve_owned(&state, user.id, &id).await?;
    let _guard = state.entry_locks.acquire(user.id).await;
    let entries = state.entries.delete_by_category(category.id).await;
    state.goals.delete_by_category(category.id).await;
    state.categories.delete(category.id).await;
    tracing::info!(category = %category.name, entries, "category deleted");
    Ok(Json(json!({
        "message": "Your category was deleted successfully.",
    })))
}

// Treats foreign ids the same as unknown ones so the response does not leak
// which ids exist.
async fn resolve_owned(state: &AppState, owner: Uuid, id: &str) -> Result<Category, ApiError> {
    let not_found = || ApiError::NotFound("This category does not exist.".to_string());
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    match state.categories.get(id).await {
        Some(category) if category.owner == owner => Ok(category),
        _ => Err(not_found()),
    }
}
