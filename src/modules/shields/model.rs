use serde::Serialize;
use uuid::Uuid;

/// Topics a user never wants to see in post listings. One shield per user,
/// created with the account.
#[derive(Debug, Clone)]
pub struct Shield {
    pub id: Uuid,
    pub owner: Uuid,
    pub topics: Vec<String>,
}

impl Shield {
    pub fn new(owner: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner,
            topics: Vec::new(),
        }
    }

    pub fn view(&self) -> ShieldView {
        ShieldView {
            topics: self.topics.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShieldView {
    pub topics: Vec<String>,
}

/// Topics are compared case-insensitively; normalize once at the boundary.
pub fn normalize_topic(raw: &str) -> String {
    raw.trim().to_lowercase()
}
