use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A named audience for restricted posts. Members must follow the owner.
#[derive(Debug, Clone)]
pub struct Circle {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub members: Vec<Uuid>,
    pub created: DateTime<Utc>,
}

impl Circle {
    pub fn new(owner: Uuid, name: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner,
            name,
            members: Vec::new(),
            created: Utc::now(),
        }
    }

    pub fn has_member(&self, user: Uuid) -> bool {
        self.members.contains(&user)
    }

    pub fn view(&self, owner: &str, members: Vec<String>) -> CircleView {
        CircleView {
            id: self.id,
            owner: owner.to_string(),
            name: self.name.clone(),
            members,
            created: self.created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircleView {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub members: Vec<String>,
    pub created: DateTime<Utc>,
}

/// Letters, digits, underscores, hyphens, and spaces; at least one character.
pub fn valid_circle_name(name: &str) -> bool {
    !name.is_empty()
        && !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ')
}
