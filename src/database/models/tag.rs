use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "#3498db";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_by: Uuid,
    /// Number of the owner's contacts referencing this tag
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn summary(&self) -> TagSummary {
        TagSummary {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }

    pub fn info(&self) -> TagInfo {
        TagInfo {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            usage_count: self.usage_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInfo {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub usage_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub created_by: Uuid,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Result of the two-phase tag delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDeletion {
    pub tag: Tag,
    /// Contacts the tag was stripped from before removal
    pub detached_contacts: u64,
}
