use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::modules::shields::model::normalize_topic;
use crate::shared::auth::AuthUser;
use crate::shared::error::ApiError;
use crate::shell::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show_shield).put(toggle_topic))
}

#[derive(Deserialize)]
struct TopicBody {
    topic: Option<String>,
}

async fn show_shield(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<serde_json::Value> {
    let shield = state.shields.ensure(user.id).await;
    Json(json!({ "shield": shield.view() }))
}

async fn toggle_topic(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<TopicBody>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = body.topic.as_deref().map(normalize_topic).unwrap_or_default();
    if topic.is_empty() {
        return Err(ApiError::BadRequest(
            "Topic must be a nonempty string.".to_string(),
        ));
    }
    let shield = state.shields.toggle_topic(user.id, topic.clone()).await;
    let action = if shield.topics.contains(&topic) {
        "now blocks"
    } else {
        "no longer blocks"
    };
    Ok(Json(json!({
        "message": format!("Your shield {action} {topic}."),
        "shield": shield.view(),
    })))
}

#[cfg(test)]
mod shield_routes_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::tests::fixtures::{app, body_json, request, send, signup};

    #[tokio::test]
    async fn it_should_start_with_an_empty_shield() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        let response = send(&app, request("GET", "/api/shield", Some(&cookie), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["shield"]["topics"], json!([]));
    }

    #[tokio::test]
    async fn it_should_toggle_a_topic_case_insensitively() {
        let app = app();
        let cookie = signup(&app, "ada").await;

        let added = send(
            &app,
            request(
                "PUT",
                "/api/shield",
                Some(&cookie),
                Some(&json!({ "topic": "  Deadlines " })),
            ),
        )
        .await;
        assert_eq!(added.status(), StatusCode::OK);
        let body = body_json(added).await;
        assert_eq!(body["shield"]["topics"], json!(["deadlines"]));

        let removed = send(
            &app,
            request(
                "PUT",
                "/api/shield",
                Some(&cookie),
                Some(&json!({ "topic": "DEADLINES" })),
            ),
        )
        .await;
        let body = body_json(removed).await;
        assert_eq!(body["shield"]["topics"], json!([]));
    }

    #[tokio::test]
    async fn it_should_reject_a_blank_topic() {
        let app = app();
        let cookie = signup(&app, "ada").await;
        for body in [json!({}), json!({ "topic": "   " })] {
            let response = send(&app, request("PUT", "/api/shield", Some(&cookie), Some(&body))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
