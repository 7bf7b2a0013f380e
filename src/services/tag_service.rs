use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::validation;
use super::{ServiceError, ServiceResult};
use crate::database::models::{NewTag, Tag, TagChanges, TagDeletion};
use crate::database::{DatabaseError, Store};

/// Body of tag create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Owner-scoped tag registry
#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn Store>,
}

impl TagService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Tags by usage count, most used first
    pub async fn list(&self, owner: Uuid) -> ServiceResult<Vec<Tag>> {
        let tags = self.store.list_tags(owner).await?;
        if tags.is_empty() {
            return Err(ServiceError::NoTags);
        }
        Ok(tags)
    }

    /// The owner's tag, or `TagNotFound` when it is missing or belongs to someone else
    pub async fn owned(&self, owner: Uuid, tag_id: Uuid) -> ServiceResult<Tag> {
        self.store
            .find_tag(owner, tag_id)
            .await?
            .ok_or(ServiceError::TagNotFound)
    }

    pub async fn create(&self, owner: Uuid, input: TagInput) -> ServiceResult<Tag> {
        let name = validation::tag_name(input.name.as_deref())?;
        let color = validation::tag_color(input.color.as_deref())?;

        // Early rejection; the store's unique index has the final word
        if self.store.find_tag_by_name(owner, &name, None).await?.is_some() {
            return Err(ServiceError::DuplicateTag(name));
        }

        let tag = self
            .store
            .insert_tag(NewTag {
                created_by: owner,
                name: name.clone(),
                color,
            })
            .await
            .map_err(|e| duplicate_or(e, &name))?;

        info!("Created tag {} ({}) for user {}", tag.name, tag.id, owner);
        Ok(tag)
    }

    pub async fn update(&self, owner: Uuid, tag_id: Uuid, input: TagInput) -> ServiceResult<Tag> {
        if input.name.is_none() && input.color.is_none() {
            return Err(ServiceError::validation("At least one field is required for update"));
        }

        let changes = TagChanges {
            name: input
                .name
                .as_deref()
                .map(|n| validation::tag_name(Some(n)))
                .transpose()?,
            color: input
                .color
                .as_deref()
                .map(|c| validation::tag_color(Some(c)))
                .transpose()?,
        };

        self.owned(owner, tag_id).await?;

        if let Some(name) = &changes.name {
            if self.store.find_tag_by_name(owner, name, Some(tag_id)).await?.is_some() {
                return Err(ServiceError::DuplicateTag(name.clone()));
            }
        }

        let display = changes.name.clone().unwrap_or_default();
        self.store
            .update_tag(owner, tag_id, &changes)
            .await
            .map_err(|e| duplicate_or(e, &display))?
            .ok_or(ServiceError::TagNotFound)
    }

    /// Strips the tag from every contact of the owner, then deletes it
    pub async fn delete(&self, owner: Uuid, tag_id: Uuid) -> ServiceResult<TagDeletion> {
        let deletion = self
            .store
            .delete_tag(owner, tag_id)
            .await?
            .ok_or(ServiceError::TagNotFound)?;

        debug!(
            "Deleted tag {} after detaching it from {} contacts",
            deletion.tag.id, deletion.detached_contacts
        );
        Ok(deletion)
    }
}

fn duplicate_or(err: DatabaseError, name: &str) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => ServiceError::DuplicateTag(name.to_string()),
        other => ServiceError::Database(other),
    }
}
