use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub joined: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            username,
            password_hash,
            joined: Utc::now(),
        }
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            joined: self.joined,
        }
    }
}

/// What the API exposes about an account; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            created: Utc::now(),
        }
    }
}

pub fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn valid_password(password: &str) -> bool {
    !password.is_empty() && !password.chars().any(char::is_whitespace)
}
