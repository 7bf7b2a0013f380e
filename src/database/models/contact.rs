use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::tag::TagSummary;

/// A stored contact. `tags` holds tag ids in attachment order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_favorite: bool,
    pub tags: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn has_tag(&self, tag_id: Uuid) -> bool {
        self.tags.contains(&tag_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub created_by: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_favorite: bool,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_favorite: Option<bool>,
}

impl ContactChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.is_favorite.is_none()
    }

    pub fn favorite(value: bool) -> Self {
        Self {
            is_favorite: Some(value),
            ..Default::default()
        }
    }
}

/// Which of an owner's contacts a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFilter {
    All,
    Favorites,
    WithTag(Uuid),
    WithoutTag(Uuid),
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        match self {
            ContactFilter::All => true,
            ContactFilter::Favorites => contact.is_favorite,
            ContactFilter::WithTag(tag_id) => contact.has_tag(*tag_id),
            ContactFilter::WithoutTag(tag_id) => !contact.has_tag(*tag_id),
        }
    }
}

/// Contact as returned by the API, with tag references resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_favorite: bool,
    pub tags: Vec<TagSummary>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactView {
    pub fn new(contact: Contact, tags: Vec<TagSummary>) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            is_favorite: contact.is_favorite,
            tags,
            created_by: contact.created_by,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }

    pub fn tag_ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// Slim projection used when picking contacts to tag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<Contact> for ContactSummary {
    fn from(contact: Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
        }
    }
}
