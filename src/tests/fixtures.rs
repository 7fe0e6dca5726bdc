// Shared helpers for router tests. Each test builds a full application over
// fresh in-memory stores and talks to it through `oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::shell::http::router;
use crate::shell::state::AppState;

/// Password shared by every test account.
pub const TEST_PASSWORD: &str = "correct-horse";

pub fn app() -> Router {
    router(AppState::in_memory())
}

pub fn request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// The `name=value` pair of the session cookie the response set.
pub fn session_cookie_from(response: &Response<Body>) -> String {
    let header = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("cookie text");
    header.split(';').next().expect("cookie pair").to_string()
}

/// Registers an account and returns the cookie of its fresh session.
pub async fn signup(app: &Router, username: &str) -> String {
    let response = send(
        app,
        request(
            "POST",
            "/api/users",
            None,
            Some(&json!({ "username": username, "password": TEST_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    session_cookie_from(&response)
}
