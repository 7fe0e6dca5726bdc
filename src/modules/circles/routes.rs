use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::circles::model::{Circle, CircleView, valid_circle_name};
use crate::modules::users::model::User;
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_circles).post(create_circle))
        .route("/{name}", get(show_circle).delete(delete_circle))
        .route("/{name}/members", put(toggle_member))
}

#[derive(Deserialize)]
struct CircleBody {
    name: String,
}

#[derive(Deserialize)]
struct MemberBody {
    username: Option<String>,
}

async fn list_circles(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let circles = state.circles.list_by_owner(user.id).await;
    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut views = Vec::with_capacity(circles.len());
    for circle in &circles {
        views.push(circle_view(&state, &mut names, &user.username, circle).await?);
    }
    Ok(Json(json!({ "circles": views })))
}

async fn create_circle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CircleBody>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_circle_name(&body.name) {
        return Err(ApiError::BadRequest(
            "Circle names must be nonempty strings of letters, numbers, underscores, hyphens, and spaces."
                .to_string(),
        ));
    }
    let circle = state
        .circles
        .insert(Circle::new(user.id, body.name))
        .await
        .map_err(|_| ApiError::Conflict("You already have a circle with this name.".to_string()))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Your circle was created successfully.",
            "circle": circle.view(&user.username, Vec::new()),
        })),
    ))
}

async fn show_circle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let circle = state
        .circles
        .find(user.id, &name)
        .await
        .ok_or_else(|| circle_not_found(&name))?;
    let mut names: HashMap<Uuid, String> = HashMap::new();
    Ok(Json(json!({
        "circle": circle_view(&state, &mut names, &user.username, &circle).await?,
    })))
}

async fn toggle_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
    Json(body): Json<MemberBody>,
) -> Result<impl IntoResponse, ApiError> {
    let circle = state
        .circles
        .find(user.id, &name)
        .await
        .ok_or_else(|| circle_not_found(&name))?;
    let username = body
        .username
        .ok_or_else(|| ApiError::BadRequest("Missing username to toggle.".to_string()))?;
    let member = resolve_username(&state, &username).await?;
    let adding = !circle.has_member(member.id);
    // Joining a circle requires following its owner; removal is always
    // allowed so an owner can clean up after an unfollow.
    if adding && state.follows.find(member.id, user.id).await.is_none() {
        return Err(ApiError::Forbidden(
            "Circle members must follow you.".to_string(),
        ));
    }
    let toggled = state
        .circles
        .toggle_member(user.id, &name, member.id)
        .await
        .map_err(|_| circle_not_found(&name))?;
    let action = if adding { "added to" } else { "removed from" };
    let mut names: HashMap<Uuid, String> = HashMap::new();
    Ok(Json(json!({
        "message": format!(
            "{} was {action} your circle {}.",
            member.username, toggled.name
        ),
        "circle": circle_view(&state, &mut names, &user.username, &toggled).await?,
    })))
}

async fn delete_circle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.circles.find(user.id, &name).await.is_none() {
        return Err(circle_not_found(&name));
    }
    // Posts restricted to the circle lose their audience with it.
    state.posts.delete_in_circle(user.id, &name).await;
    state.circles.delete(user.id, &name).await;
    Ok(Json(json!({ "message": "Your circle was deleted successfully." })))
}

async fn circle_view(
    state: &AppState,
    names: &mut HashMap<Uuid, String>,
    owner: &str,
    circle: &Circle,
) -> Result<CircleView, ApiError> {
    let mut members = Vec::with_capacity(circle.members.len());
    for member in &circle.members {
        members.push(username_of(state, names, *member).await?);
    }
    Ok(circle.view(owner, members))
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
        .ok_or_else(|| ApiError::Internal(anyhow!("circle references a missing member")))?;
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

fn circle_not_found(name: &str) -> ApiError {
    ApiError::NotFound(format!("Circle with name {name} does not exist."))
}

#[cfg(test)]
mod circle_routes_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::tests::fixtures::{app, body_json, request, send, signup};

    async fn follow(app: &axum::Router, cookie: &str, username: &str) {
        let response = send(
            app,
            request(
                "POST",
                "/api/follows",
                Some(cookie),
                Some(&json!({ "username": username })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn it_should_create_and_list_circles() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        let response = send(
            &app,
            request(
                "POST",
                "/api/circles",
                Some(&cookie),
                Some(&json!({ "name": "book club" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let listed = send(&app, request("GET", "/api/circles", Some(&cookie), None)).await;
        let body = body_json(listed).await;
        assert_eq!(body["circles"][0]["name"], "book club");
        assert_eq!(body["circles"][0]["owner"], "ada");

        let fetched = send(
            &app,
            request("GET", "/api/circles/book%20club", Some(&cookie), None),
        )
        .await;
        assert_eq!(fetched.status(), StatusCode::OK);
        let body = body_json(fetched).await;
        assert_eq!(body["circle"]["name"], "book club");
        assert_eq!(body["circle"]["members"], json!([]));

        let missing = send(&app, request("GET", "/api/circles/ghost", Some(&cookie), None)).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn it_should_reject_invalid_and_duplicate_names() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        for name in ["", "   ", "caf\u{e9}"] {
            let response = send(
                &app,
                request(
                    "POST",
                    "/api/circles",
                    Some(&cookie),
                    Some(&json!({ "name": name })),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let body = json!({ "name": "book club" });
        assert_eq!(
            send(&app, request("POST", "/api/circles", Some(&cookie), Some(&body)))
                .await
                .status(),
            StatusCode::CREATED
        );
        assert_eq!(
            send(&app, request("POST", "/api/circles", Some(&cookie), Some(&body)))
                .await
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn it_should_only_admit_members_who_follow_the_owner() {
        let app = app();
        let ada = signup(&app, "ada").await;
        let grace = signup(&app, "grace").await;
        send(
            &app,
            request(
                "POST",
                "/api/circles",
                Some(&ada),
                Some(&json!({ "name": "close" })),
            ),
        )
        .await;

        let premature = send(
            &app,
            request(
                "PUT",
                "/api/circles/close/members",
                Some(&ada),
                Some(&json!({ "username": "grace" })),
            ),
        )
        .await;
        assert_eq!(premature.status(), StatusCode::FORBIDDEN);

        follow(&app, &grace, "ada").await;
        let added = send(
            &app,
            request(
                "PUT",
                "/api/circles/close/members",
                Some(&ada),
                Some(&json!({ "username": "grace" })),
            ),
        )
        .await;
        assert_eq!(added.status(), StatusCode::OK);
        let body = body_json(added).await;
        assert_eq!(body["circle"]["members"], json!(["grace"]));

        // Toggling again removes the member, follow or not.
        let removed = send(
            &app,
            request(
                "PUT",
                "/api/circles/close/members",
                Some(&ada),
                Some(&json!({ "username": "grace" })),
            ),
        )
        .await;
        assert_eq!(removed.status(), StatusCode::OK);
        let body = body_json(removed).await;
        assert_eq!(body["circle"]["members"], json!([]));
    }

    #[tokio::test]
    async fn it_should_404_a_missing_circle_or_member() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        let no_circle = send(
            &app,
            request(
                "PUT",
                "/api/circles/ghost/members",
                Some(&cookie),
                Some(&json!({ "username": "ada" })),
            ),
        )
        .await;
        assert_eq!(no_circle.status(), StatusCode::NOT_FOUND);

        send(
            &app,
            request(
                "POST",
                "/api/circles",
                Some(&cookie),
                Some(&json!({ "name": "close" })),
            ),
        )
        .await;
        let no_member = send(
            &app,
            request(
                "PUT",
                "/api/circles/close/members",
                Some(&cookie),
                Some(&json!({ "username": "nobody" })),
            ),
        )
        .await;
        assert_eq!(no_member.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn it_should_delete_the_circles_posts_with_it() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        send(
            &app,
            request(
                "POST",
                "/api/circles",
                Some(&cookie),
                Some(&json!({ "name": "close" })),
            ),
        )
        .await;
        for body in [
            json!({ "content": "for everyone" }),
            json!({ "content": "for the circle", "circle": "close" }),
        ] {
            let response = send(&app, request("POST", "/api/posts", Some(&cookie), Some(&body))).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let deleted = send(&app, request("DELETE", "/api/circles/close", Some(&cookie), None)).await;
        assert_eq!(deleted.status(), StatusCode::OK);

        let posts = send(&app, request("GET", "/api/posts", Some(&cookie), None)).await;
        let body = body_json(posts).await;
        let posts = body["posts"].as_array().expect("array");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["content"], "for everyone");
    }
}
