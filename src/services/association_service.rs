//! Linking tags to contacts.
//!
//! A (contact, tag) pair is either linked or unlinked. Every transition
//! goes through a single store call that changes the link and the tag's
//! usage count together, so the count always equals the number of the
//! owner's contacts carrying the tag.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::contact_service::{present, present_one};
use super::validation;
use super::{ServiceError, ServiceResult};
use crate::database::models::{ContactFilter, ContactSummary, ContactView, Tag, TagInfo};
use crate::database::{DatabaseError, Store};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInput {
    pub contact_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLinkInput {
    pub contact_ids: Option<Vec<String>>,
}

/// Contact and tag after a link or unlink
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutcome {
    pub contact: ContactView,
    pub tag: Tag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkLinkStatus {
    Added,
    AlreadyHasTag,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLinkResult {
    pub contact_id: Uuid,
    pub name: String,
    pub status: BulkLinkStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLinkReport {
    pub tag: TagInfo,
    pub total_processed: usize,
    pub added_count: usize,
    pub results: Vec<BulkLinkResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaggedContacts {
    pub tag: TagInfo,
    pub contacts: Vec<ContactView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableContacts {
    pub tag: TagInfo,
    pub contacts: Vec<ContactSummary>,
}

#[derive(Clone)]
pub struct AssociationService {
    store: Arc<dyn Store>,
}

impl AssociationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn owned_tag(&self, owner: Uuid, tag_id: Uuid) -> ServiceResult<Tag> {
        self.store
            .find_tag(owner, tag_id)
            .await?
            .ok_or(ServiceError::TagNotFound)
    }

    /// Parses the `contactId` of a single-link request body
    pub fn contact_id(input: &LinkInput) -> ServiceResult<Uuid> {
        match input.contact_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => validation::parse_id(raw),
            _ => Err(ServiceError::validation("Please provide a contact ID in the request body")),
        }
    }

    pub async fn link(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> ServiceResult<LinkOutcome> {
        self.owned_tag(owner, tag_id).await?;
        let contact = self
            .store
            .find_contact(owner, contact_id)
            .await?
            .ok_or(ServiceError::ContactNotFound)?;
        if contact.has_tag(tag_id) {
            return Err(ServiceError::AlreadyAssigned);
        }

        let attached = match self.store.attach_tag(owner, tag_id, &[contact_id]).await {
            Ok(attached) => attached,
            Err(DatabaseError::NotFound(_)) => Vec::new(),
            Err(other) => return Err(other.into()),
        };
        if attached.is_empty() {
            return Err(self.link_conflict(owner, tag_id, contact_id).await);
        }

        debug!("Linked tag {} to contact {}", tag_id, contact_id);
        self.outcome(owner, tag_id, contact_id).await
    }

    pub async fn unlink(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> ServiceResult<LinkOutcome> {
        self.owned_tag(owner, tag_id).await?;
        let contact = self
            .store
            .find_contact(owner, contact_id)
            .await?
            .ok_or(ServiceError::ContactNotFound)?;
        if !contact.has_tag(tag_id) {
            return Err(ServiceError::NotAssigned);
        }

        if !self.store.detach_tag(owner, tag_id, contact_id).await? {
            return Err(ServiceError::NotAssigned);
        }

        debug!("Unlinked tag {} from contact {}", tag_id, contact_id);
        self.outcome(owner, tag_id, contact_id).await
    }

    /// Explains a link that changed nothing: the tag or the contact was
    /// deleted concurrently, or another request linked the pair first.
    async fn link_conflict(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> ServiceError {
        match self.store.find_tag(owner, tag_id).await {
            Ok(None) => return ServiceError::TagNotFound,
            Err(e) => return e.into(),
            Ok(Some(_)) => {}
        }
        match self.store.find_contact(owner, contact_id).await {
            Ok(None) => ServiceError::ContactNotFound,
            Ok(Some(_)) => ServiceError::AlreadyAssigned,
            Err(e) => e.into(),
        }
    }

    async fn outcome(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> ServiceResult<LinkOutcome> {
        let contact = self
            .store
            .find_contact(owner, contact_id)
            .await?
            .ok_or(ServiceError::ContactNotFound)?;
        let tag = self.owned_tag(owner, tag_id).await?;
        let contact = present_one(self.store.as_ref(), owner, contact).await?;
        Ok(LinkOutcome { contact, tag })
    }

    /// Links many contacts at once. Duplicate, malformed and unknown ids are
    /// dropped; contacts already carrying the tag are reported, not relinked.
    pub async fn bulk_link(&self, owner: Uuid, tag_id: Uuid, input: BulkLinkInput) -> ServiceResult<BulkLinkReport> {
        let raw_ids = match input.contact_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(ServiceError::validation("Please provide an array of contact IDs")),
        };

        self.owned_tag(owner, tag_id).await?;

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = raw_ids
            .iter()
            .filter_map(|raw| validation::parse_id(raw).ok())
            .filter(|id| seen.insert(*id))
            .collect();

        let mut found = self.store.find_contacts(owner, &ids).await?;
        if found.is_empty() {
            return Err(ServiceError::NoMatchingContacts);
        }
        // Report in request order
        found.sort_by_key(|c| ids.iter().position(|id| *id == c.id));

        let candidates: Vec<Uuid> = found.iter().filter(|c| !c.has_tag(tag_id)).map(|c| c.id).collect();
        let attached: HashSet<Uuid> = self
            .store
            .attach_tag(owner, tag_id, &candidates)
            .await
            .map_err(tag_gone)?
            .into_iter()
            .collect();

        let results: Vec<BulkLinkResult> = found
            .into_iter()
            .map(|contact| BulkLinkResult {
                status: if attached.contains(&contact.id) {
                    BulkLinkStatus::Added
                } else {
                    BulkLinkStatus::AlreadyHasTag
                },
                contact_id: contact.id,
                name: contact.name,
            })
            .collect();

        let tag = self.owned_tag(owner, tag_id).await?;
        debug!("Bulk linked tag {} to {} of {} contacts", tag_id, attached.len(), results.len());

        Ok(BulkLinkReport {
            tag: tag.info(),
            total_processed: results.len(),
            added_count: attached.len(),
            results,
        })
    }

    pub async fn contacts_by_tag(&self, owner: Uuid, tag_id: Uuid) -> ServiceResult<TaggedContacts> {
        let tag = self.owned_tag(owner, tag_id).await?;
        let contacts = self.store.list_contacts(owner, ContactFilter::WithTag(tag_id)).await?;
        if contacts.is_empty() {
            return Err(ServiceError::NoContactsForTag { tag_name: tag.name });
        }

        Ok(TaggedContacts {
            tag: tag.info(),
            contacts: present(self.store.as_ref(), owner, contacts).await?,
        })
    }

    /// The owner's contacts that do not carry the tag yet. May be empty.
    pub async fn contacts_not_in_tag(&self, owner: Uuid, tag_id: Uuid) -> ServiceResult<AvailableContacts> {
        let tag = self.owned_tag(owner, tag_id).await?;
        let contacts = self
            .store
            .list_contacts(owner, ContactFilter::WithoutTag(tag_id))
            .await?
            .into_iter()
            .map(ContactSummary::from)
            .collect();

        Ok(AvailableContacts {
            tag: tag.info(),
            contacts,
        })
    }
}

/// The tag vanished between lookup and write
fn tag_gone(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::NotFound(_) => ServiceError::TagNotFound,
        other => ServiceError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn bulk(ids: &[String]) -> BulkLinkInput {
        BulkLinkInput {
            contact_ids: Some(ids.to_vec()),
        }
    }

    #[tokio::test]
    async fn link_twice_is_already_assigned_and_counts_once() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let alan = ctx.contact(owner, "Alan").await;

        let outcome = ctx.associations.link(owner, tag.id, alan.id).await.unwrap();
        assert_eq!(outcome.tag.usage_count, 1);
        assert_eq!(outcome.contact.tag_ids(), vec![tag.id]);

        let err = ctx.associations.link(owner, tag.id, alan.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyAssigned));
        assert_eq!(ctx.tags.owned(owner, tag.id).await.unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn empty_link_reports_what_disappeared() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let alan = ctx.contact(owner, "Alan").await;
        let grace = ctx.contact(owner, "Grace").await;

        ctx.associations.link(owner, tag.id, grace.id).await.unwrap();
        assert!(matches!(
            ctx.associations.link_conflict(owner, tag.id, grace.id).await,
            ServiceError::AlreadyAssigned
        ));

        // Contact deleted between the ownership check and the attach
        ctx.contacts.delete(owner, alan.id).await.unwrap();
        assert!(ctx.store.attach_tag(owner, tag.id, &[alan.id]).await.unwrap().is_empty());
        assert!(matches!(
            ctx.associations.link_conflict(owner, tag.id, alan.id).await,
            ServiceError::ContactNotFound
        ));
        assert!(matches!(
            ctx.associations.link(owner, tag.id, alan.id).await,
            Err(ServiceError::ContactNotFound)
        ));

        ctx.tags.delete(owner, tag.id).await.unwrap();
        assert!(matches!(
            ctx.associations.link_conflict(owner, tag.id, grace.id).await,
            ServiceError::TagNotFound
        ));
        assert!(matches!(ctx.tags.list(owner).await, Err(ServiceError::NoTags)));
    }

    #[tokio::test]
    async fn unlink_requires_a_link() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let alan = ctx.contact(owner, "Alan").await;

        let err = ctx.associations.unlink(owner, tag.id, alan.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAssigned));

        ctx.associations.link(owner, tag.id, alan.id).await.unwrap();
        let outcome = ctx.associations.unlink(owner, tag.id, alan.id).await.unwrap();
        assert_eq!(outcome.tag.usage_count, 0);
        assert!(outcome.contact.tags.is_empty());
    }

    #[tokio::test]
    async fn link_checks_tag_before_contact() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let alan = ctx.contact(owner, "Alan").await;

        assert!(matches!(
            ctx.associations.link(owner, Uuid::new_v4(), Uuid::new_v4()).await,
            Err(ServiceError::TagNotFound)
        ));
        assert!(matches!(
            ctx.associations.link(owner, tag.id, Uuid::new_v4()).await,
            Err(ServiceError::ContactNotFound)
        ));
        assert!(ctx.associations.link(owner, tag.id, alan.id).await.is_ok());
    }

    #[tokio::test]
    async fn cannot_link_across_users() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;
        let bob = ctx.user("bob").await;
        let ada_tag = ctx.tag(ada, "Work").await;
        let bob_contact = ctx.contact(bob, "Bert").await;
        let bob_tag = ctx.tag(bob, "Work").await;

        assert!(matches!(
            ctx.associations.link(ada, ada_tag.id, bob_contact.id).await,
            Err(ServiceError::ContactNotFound)
        ));
        assert!(matches!(
            ctx.associations.link(ada, bob_tag.id, bob_contact.id).await,
            Err(ServiceError::TagNotFound)
        ));

        ctx.associations.link(bob, bob_tag.id, bob_contact.id).await.unwrap();
        assert!(matches!(
            ctx.associations.unlink(ada, bob_tag.id, bob_contact.id).await,
            Err(ServiceError::TagNotFound)
        ));
        assert_eq!(ctx.tags.owned(bob, bob_tag.id).await.unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn bulk_link_reports_added_and_existing() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let a = ctx.contact(owner, "A").await;
        let b = ctx.contact(owner, "B").await;
        ctx.associations.link(owner, tag.id, b.id).await.unwrap();

        let ids = vec![
            a.id.to_string(),
            b.id.to_string(),
            b.id.to_string(),
            Uuid::new_v4().to_string(),
            "not-an-id".to_string(),
        ];
        let report = ctx.associations.bulk_link(owner, tag.id, bulk(&ids)).await.unwrap();

        assert_eq!(report.total_processed, 2);
        assert_eq!(report.added_count, 1);
        assert_eq!(report.results[0].contact_id, a.id);
        assert_eq!(report.results[0].status, BulkLinkStatus::Added);
        assert_eq!(report.results[1].contact_id, b.id);
        assert_eq!(report.results[1].status, BulkLinkStatus::AlreadyHasTag);
        assert_eq!(report.tag.usage_count, 2);
    }

    #[tokio::test]
    async fn bulk_link_needs_ids_that_resolve() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let other = ctx.user("bob").await;
        let tag = ctx.tag(owner, "Work").await;
        let foreign = ctx.contact(other, "Bert").await;

        let err = ctx
            .associations
            .bulk_link(owner, tag.id, BulkLinkInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let err = ctx.associations.bulk_link(owner, tag.id, bulk(&[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let err = ctx
            .associations
            .bulk_link(owner, tag.id, bulk(&[foreign.id.to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoMatchingContacts));
        assert_eq!(ctx.tags.owned(owner, tag.id).await.unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn usage_count_tracks_references() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let a = ctx.contact(owner, "A").await;
        let b = ctx.contact(owner, "B").await;
        let c = ctx.contact(owner, "C").await;

        let ids: Vec<String> = [&a, &b, &c].iter().map(|x| x.id.to_string()).collect();
        ctx.associations.bulk_link(owner, tag.id, bulk(&ids)).await.unwrap();
        ctx.associations.unlink(owner, tag.id, b.id).await.unwrap();
        ctx.contacts.delete(owner, c.id).await.unwrap();

        let referencing = ctx
            .store
            .list_contacts(owner, ContactFilter::WithTag(tag.id))
            .await
            .unwrap()
            .len() as i64;
        assert_eq!(referencing, 1);
        assert_eq!(ctx.tags.owned(owner, tag.id).await.unwrap().usage_count, referencing);
    }

    #[tokio::test]
    async fn contacts_by_tag_distinguishes_missing_tag_from_no_contacts() {
        let ctx = TestContext::new();
        let owner = ctx.user("ada").await;
        let tag = ctx.tag(owner, "Work").await;
        let alan = ctx.contact(owner, "Alan").await;

        assert!(matches!(
            ctx.associations.contacts_by_tag(owner, Uuid::new_v4()).await,
            Err(ServiceError::TagNotFound)
        ));
        assert!(matches!(
            ctx.associations.contacts_by_tag(owner, tag.id).await,
            Err(ServiceError::NoContactsForTag { .. })
        ));

        ctx.associations.link(owner, tag.id, alan.id).await.unwrap();
        let tagged = ctx.associations.contacts_by_tag(owner, tag.id).await.unwrap();
        assert_eq!(tagged.contacts.len(), 1);
        assert_eq!(tagged.tag.usage_count, 1);
    }

    #[tokio::test]
    async fn contacts_not_in_tag_is_owner_scoped() {
        let ctx = TestContext::new();
        let ada = ctx.user("ada").await;
        let bob = ctx.user("bob").await;
        let tag = ctx.tag(ada, "Work").await;
        let alan = ctx.contact(ada, "Alan").await;
        let bea = ctx.contact(ada, "Bea").await;
        ctx.contact(bob, "Bert").await;
        ctx.associations.link(ada, tag.id, alan.id).await.unwrap();

        let available = ctx.associations.contacts_not_in_tag(ada, tag.id).await.unwrap();
        let ids: Vec<Uuid> = available.contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![bea.id]);

        ctx.associations.link(ada, tag.id, bea.id).await.unwrap();
        let available = ctx.associations.contacts_not_in_tag(ada, tag.id).await.unwrap();
        assert!(available.contacts.is_empty());
    }

    #[test]
    fn single_link_body_needs_a_valid_id() {
        assert!(matches!(
            AssociationService::contact_id(&LinkInput::default()),
            Err(ServiceError::Validation { .. })
        ));
        let bad = LinkInput {
            contact_id: Some("xyz".to_string()),
        };
        assert!(matches!(AssociationService::contact_id(&bad), Err(ServiceError::InvalidId)));
        let id = Uuid::new_v4();
        let good = LinkInput {
            contact_id: Some(id.to_string()),
        };
        assert_eq!(AssociationService::contact_id(&good).unwrap(), id);
    }
}
