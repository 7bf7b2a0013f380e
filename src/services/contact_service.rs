use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::validation;
use super::{ServiceError, ServiceResult};
use crate::database::models::{Contact, ContactChanges, ContactFilter, ContactView, NewContact, TagSummary};
use crate::database::Store;

/// Body of contact create and update requests.
/// Unknown keys such as `createdBy` or `tags` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_favorite: Option<bool>,
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn Store>,
}

impl ContactService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, owner: Uuid) -> ServiceResult<Vec<ContactView>> {
        let contacts = self.store.list_contacts(owner, ContactFilter::All).await?;
        if contacts.is_empty() {
            return Err(ServiceError::NoContacts);
        }
        present(self.store.as_ref(), owner, contacts).await
    }

    pub async fn list_favorites(&self, owner: Uuid) -> ServiceResult<Vec<ContactView>> {
        let contacts = self.store.list_contacts(owner, ContactFilter::Favorites).await?;
        if contacts.is_empty() {
            return Err(ServiceError::NoFavorites);
        }
        present(self.store.as_ref(), owner, contacts).await
    }

    /// The owner's contact, or `ContactNotFound`
    pub async fn owned(&self, owner: Uuid, contact_id: Uuid) -> ServiceResult<Contact> {
        self.store
            .find_contact(owner, contact_id)
            .await?
            .ok_or(ServiceError::ContactNotFound)
    }

    pub async fn create(&self, owner: Uuid, input: ContactInput) -> ServiceResult<ContactView> {
        let mut errors = HashMap::new();
        let name = validation::required("name", input.name.as_deref(), &mut errors);
        let email = validation::required("email", input.email.as_deref(), &mut errors);
        let phone = validation::required("phone", input.phone.as_deref(), &mut errors);

        if let Some(email) = &email {
            if !validation::is_valid_email(email) {
                errors.insert("email".to_string(), "Please provide a valid email address".to_string());
            }
        }

        let (Some(name), Some(email), Some(phone)) = (name, email, phone) else {
            return Err(ServiceError::invalid_fields("All fields are required", errors));
        };
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields("Validation failed", errors));
        }

        let contact = self
            .store
            .insert_contact(NewContact {
                created_by: owner,
                name,
                email,
                phone,
                is_favorite: input.is_favorite.unwrap_or(false),
            })
            .await?;

        info!("Created contact {} for user {}", contact.id, owner);
        Ok(ContactView::new(contact, Vec::new()))
    }

    pub async fn update(&self, owner: Uuid, contact_id: Uuid, input: ContactInput) -> ServiceResult<ContactView> {
        let changes = ContactChanges {
            name: input.name,
            email: input.email,
            phone: input.phone,
            is_favorite: input.is_favorite,
        };
        if changes.is_empty() {
            return Err(ServiceError::validation("At least one field is required for update"));
        }

        let changes = Self::validate_changes(changes)?;
        let contact = self
            .store
            .update_contact(owner, contact_id, &changes)
            .await?
            .ok_or(ServiceError::ContactNotFound)?;

        present_one(self.store.as_ref(), owner, contact).await
    }

    fn validate_changes(mut changes: ContactChanges) -> ServiceResult<ContactChanges> {
        let mut errors = HashMap::new();
        for (field, value) in [
            ("name", &mut changes.name),
            ("email", &mut changes.email),
            ("phone", &mut changes.phone),
        ] {
            if let Some(raw) = value.as_deref() {
                *value = validation::required(field, Some(raw), &mut errors);
            }
        }
        if let Some(email) = &changes.email {
            if !validation::is_valid_email(email) {
                errors.insert("email".to_string(), "Please provide a valid email address".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::invalid_fields("Validation failed", errors));
        }
        Ok(changes)
    }

    /// Deletes the contact and releases its tags
    pub async fn delete(&self, owner: Uuid, contact_id: Uuid) -> ServiceResult<ContactView> {
        let contact = self
            .store
            .delete_contact(owner, contact_id)
            .await?
            .ok_or(ServiceError::ContactNotFound)?;

        info!("Deleted contact {} for user {}", contact.id, owner);
        present_one(self.store.as_ref(), owner, contact).await
    }

    /// Idempotent: setting the current value again succeeds
    pub async fn set_favorite(&self, owner: Uuid, contact_id: Uuid, value: bool) -> ServiceResult<ContactView> {
        let contact = self
            .store
            .update_contact(owner, contact_id, &ContactChanges::favorite(value))
            .await?
            .ok_or(ServiceError::ContactNotFound)?;

        present_one(self.store.as_ref(), owner, contact).await
    }
}

/// Resolves the tag ids of each contact to `{id, name, color}` summaries,
/// keeping attachment order. One store round trip for the whole batch.
pub async fn present(store: &dyn Store, owner: Uuid, contacts: Vec<Contact>) -> ServiceResult<Vec<ContactView>> {
    let mut ids: Vec<Uuid> = contacts.iter().flat_map(|c| c.tags.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();

    let summaries: HashMap<Uuid, TagSummary> = store
        .tag_summaries(owner, &ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(contacts
        .into_iter()
        .map(|contact| {
            let tags = contact.tags.iter().filter_map(|id| summaries.get(id).cloned()).collect();
            ContactView::new(contact, tags)
        })
        .collect())
}

pub async fn present_one(store: &dyn Store, owner: Uuid, contact: Contact) -> ServiceResult<ContactView> {
    let mut views = present(store, owner, vec![contact]).await?;
    views.pop().ok_or(ServiceError::ContactNotFound)
}
