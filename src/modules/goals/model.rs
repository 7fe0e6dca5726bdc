use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A goal counts logged hours toward a weekly target; a budget counts them
/// against a weekly ceiling. Both aggregate the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Goal,
    Budget,
}

impl GoalKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "goal" => Some(GoalKind::Goal),
            "budget" => Some(GoalKind::Budget),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub id: Uuid,
    pub owner: Uuid,
    pub category: Uuid,
    pub hours: f64,
    pub kind: GoalKind,
    pub private: bool,
    pub created: DateTime<Utc>,
}

impl Goal {
    pub fn new(owner: Uuid, category: Uuid, hours: f64, kind: GoalKind, private: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner,
            category,
            hours,
            kind,
            private,
            created: Utc::now(),
        }
    }

    pub fn view(&self, author: &str, category: &str, progress: f64) -> GoalView {
        GoalView {
            id: self.id,
            author: author.to_string(),
            category: category.to_string(),
            hours: self.hours,
            kind: self.kind,
            private: self.private,
            created: self.created,
            progress,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    pub id: Uuid,
    pub author: String,
    pub category: String,
    pub hours: f64,
    pub kind: GoalKind,
    pub private: bool,
    pub created: DateTime<Utc>,
    pub progress: f64,
}
