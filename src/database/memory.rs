//! In-process store for development and tests.
//!
//! All data lives behind one `RwLock`; every mutating operation holds the
//! write guard for its whole duration, which gives the same atomicity the
//! PostgreSQL store gets from transactions.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Contact, ContactChanges, ContactFilter, NewContact, NewTag, NewUser, Tag, TagChanges, TagDeletion,
    TagSummary, User,
};
use super::store::{Store, StoreResult};

#[derive(Default)]
struct Inner {
    // Vectors keep insertion order, which doubles as creation order
    users: Vec<User>,
    contacts: Vec<Contact>,
    tags: Vec<Tag>,
}

impl Inner {
    fn tag_mut(&mut self, owner: Uuid, id: Uuid) -> Option<&mut Tag> {
        self.tags.iter_mut().find(|t| t.id == id && t.created_by == owner)
    }

    fn contact_mut(&mut self, owner: Uuid, id: Uuid) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.id == id && c.created_by == owner)
    }

    fn name_taken(&self, owner: Uuid, name: &str, exclude: Option<Uuid>) -> bool {
        self.tags.iter().any(|t| {
            t.created_by == owner && Some(t.id) != exclude && t.name.to_lowercase() == name.to_lowercase()
        })
    }

    fn increment_usage(&mut self, owner: Uuid, tag_id: Uuid, by: i64) {
        if let Some(tag) = self.tag_mut(owner, tag_id) {
            tag.usage_count += by;
            tag.updated_at = Utc::now();
        }
    }

    fn decrement_usage(&mut self, owner: Uuid, tag_id: Uuid) {
        if let Some(tag) = self.tag_mut(owner, tag_id) {
            if tag.usage_count > 0 {
                tag.usage_count -= 1;
                tag.updated_at = Utc::now();
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_contacts(&self, owner: Uuid, filter: ContactFilter) -> StoreResult<Vec<Contact>> {
        let inner = self.inner.read().await;
        Ok(inner
            .contacts
            .iter()
            .filter(|c| c.created_by == owner && filter.matches(c))
            .cloned()
            .collect())
    }

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let inner = self.inner.read().await;
        Ok(inner.contacts.iter().find(|c| c.id == id && c.created_by == owner).cloned())
    }

    async fn find_contacts(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<Contact>> {
        let inner = self.inner.read().await;
        Ok(inner
            .contacts
            .iter()
            .filter(|c| c.created_by == owner && ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            is_favorite: contact.is_favorite,
            tags: Vec::new(),
            created_by: contact.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, owner: Uuid, id: Uuid, changes: &ContactChanges) -> StoreResult<Option<Contact>> {
        let mut inner = self.inner.write().await;
        let Some(contact) = inner.contact_mut(owner, id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            contact.name = name.clone();
        }
        if let Some(email) = &changes.email {
            contact.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            contact.phone = phone.clone();
        }
        if let Some(is_favorite) = changes.is_favorite {
            contact.is_favorite = is_favorite;
        }
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let mut inner = self.inner.write().await;
        let Some(index) = inner.contacts.iter().position(|c| c.id == id && c.created_by == owner) else {
            return Ok(None);
        };
        let contact = inner.contacts.remove(index);
        for tag_id in &contact.tags {
            inner.decrement_usage(owner, *tag_id);
        }
        Ok(Some(contact))
    }

    async fn list_tags(&self, owner: Uuid) -> StoreResult<Vec<Tag>> {
        let inner = self.inner.read().await;
        // Newest first, then a stable sort keeps that order among equal keys
        let mut tags: Vec<Tag> = inner.tags.iter().rev().filter(|t| t.created_by == owner).cloned().collect();
        tags.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(tags)
    }

    async fn find_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Tag>> {
        let inner = self.inner.read().await;
        Ok(inner.tags.iter().find(|t| t.id == id && t.created_by == owner).cloned())
    }

    async fn find_tag_by_name(&self, owner: Uuid, name: &str, exclude: Option<Uuid>) -> StoreResult<Option<Tag>> {
        let inner = self.inner.read().await;
        let name = name.to_lowercase();
        Ok(inner
            .tags
            .iter()
            .find(|t| t.created_by == owner && Some(t.id) != exclude && t.name.to_lowercase() == name)
            .cloned())
    }

    async fn tag_summaries(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<TagSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tags
            .iter()
            .filter(|t| t.created_by == owner && ids.contains(&t.id))
            .map(Tag::summary)
            .collect())
    }

    async fn insert_tag(&self, tag: NewTag) -> StoreResult<Tag> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(tag.created_by, &tag.name, None) {
            return Err(DatabaseError::Conflict("tags_owner_name_ci_idx".to_string()));
        }
        let now = Utc::now();
        let tag = Tag {
            id: Uuid::new_v4(),
            name: tag.name,
            color: tag.color,
            created_by: tag.created_by,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.tags.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, owner: Uuid, id: Uuid, changes: &TagChanges) -> StoreResult<Option<Tag>> {
        let mut inner = self.inner.write().await;
        if let Some(name) = &changes.name {
            if inner.tag_mut(owner, id).is_some() && inner.name_taken(owner, name, Some(id)) {
                return Err(DatabaseError::Conflict("tags_owner_name_ci_idx".to_string()));
            }
        }
        let Some(tag) = inner.tag_mut(owner, id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            tag.name = name.clone();
        }
        if let Some(color) = &changes.color {
            tag.color = color.clone();
        }
        tag.updated_at = Utc::now();
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TagDeletion>> {
        let mut inner = self.inner.write().await;
        let Some(index) = inner.tags.iter().position(|t| t.id == id && t.created_by == owner) else {
            return Ok(None);
        };

        // Phase 1: strip the tag from the owner's contacts
        let mut detached = 0;
        for contact in inner.contacts.iter_mut().filter(|c| c.created_by == owner) {
            let before = contact.tags.len();
            contact.tags.retain(|t| *t != id);
            if contact.tags.len() != before {
                contact.updated_at = Utc::now();
                detached += 1;
            }
        }

        // Phase 2: remove the tag itself
        let tag = inner.tags.remove(index);
        Ok(Some(TagDeletion {
            tag,
            detached_contacts: detached,
        }))
    }

    async fn attach_tag(&self, owner: Uuid, tag_id: Uuid, contact_ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let mut inner = self.inner.write().await;
        if inner.tag_mut(owner, tag_id).is_none() {
            return Err(DatabaseError::NotFound(format!("tag {}", tag_id)));
        }

        let mut attached = Vec::new();
        for contact_id in contact_ids {
            if let Some(contact) = inner.contact_mut(owner, *contact_id) {
                if !contact.has_tag(tag_id) {
                    contact.tags.push(tag_id);
                    contact.updated_at = Utc::now();
                    attached.push(*contact_id);
                }
            }
        }

        if !attached.is_empty() {
            inner.increment_usage(owner, tag_id, attached.len() as i64);
        }
        Ok(attached)
    }

    async fn detach_tag(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.tag_mut(owner, tag_id).is_none() {
            return Ok(false);
        }
        let removed = match inner.contact_mut(owner, contact_id) {
            Some(contact) if contact.has_tag(tag_id) => {
                contact.tags.retain(|t| *t != tag_id);
                contact.updated_at = Utc::now();
                true
            }
            _ => false,
        };
        if removed {
            inner.decrement_usage(owner, tag_id);
        }
        Ok(removed)
    }
}
