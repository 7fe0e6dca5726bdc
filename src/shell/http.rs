use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::{
    categories, circles, entries, follows, friends, goals, posts, shields, users,
};
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/users", users::routes::router())
        .nest("/api/categories", categories::routes::router())
        .nest("/api/entries", entries::routes::router())
        .nest("/api/goals", goals::routes::router())
        .nest("/api/posts", posts::routes::router())
        .nest("/api/follows", follows::routes::router())
        .nest("/api/friends", friends::routes::router())
        .nest("/api/circles", circles::routes::router())
        .nest("/api/shield", shields::routes::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Page not found." })),
    )
}

#[cfg(test)]
mod http_tests {
    use axum::http::StatusCode;

    use crate::tests::fixtures::{app, body_json, request, send};

    #[tokio::test]
    async fn it_should_serve_a_json_404_for_unknown_routes() {
        let app = app();
        let response = send(&app, request("GET", "/api/nope", None, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Page not found.");
    }

    #[tokio::test]
    async fn it_should_require_a_session_on_protected_routes() {
        let app = app();
        for uri in ["/api/categories", "/api/entries", "/api/goals", "/api/shield"] {
            let response = send(&app, request("GET", uri, None, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
