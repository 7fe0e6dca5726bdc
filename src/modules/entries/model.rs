use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::modules::entries::overlap::TimeRange;

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: Uuid,
    pub owner: Uuid,
    pub category: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tag: Option<String>,
}

impl Entry {
    pub fn new(owner: Uuid, category: Uuid, range: TimeRange, tag: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner,
            category,
            start: range.start,
            end: range.end,
            tag,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn view(&self, author: &str, category: &str) -> EntryView {
        EntryView {
            id: self.id,
            author: author.to_string(),
            category: category.to_string(),
            start: self.start,
            end: self.end,
            tag: self.tag.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: Uuid,
    pub author: String,
    pub category: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tag: Option<String>,
}
