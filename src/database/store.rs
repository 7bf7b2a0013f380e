//! Query/update interface over users, contacts and tags.
//!
//! Every contact and tag operation takes the owning user's id and only ever
//! sees rows created by that user. Operations that touch more than one
//! record (association changes, cascading tag delete, contact delete) are
//! atomic: implementations run them in a single transaction so tag usage
//! counters never drift from the actual contact references.

use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Contact, ContactChanges, ContactFilter, NewContact, NewTag, NewUser, Tag, TagChanges, TagDeletion,
    TagSummary, User,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // Users

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    // Contacts

    /// Owner's contacts in creation order.
    async fn list_contacts(&self, owner: Uuid, filter: ContactFilter) -> StoreResult<Vec<Contact>>;
    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>>;
    /// Owned contacts among `ids`, in no particular order. Unknown ids are skipped.
    async fn find_contacts(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<Contact>>;
    async fn insert_contact(&self, contact: NewContact) -> StoreResult<Contact>;
    async fn update_contact(&self, owner: Uuid, id: Uuid, changes: &ContactChanges) -> StoreResult<Option<Contact>>;
    /// Removes the contact and decrements the usage count of every tag it referenced.
    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>>;

    // Tags

    /// Owner's tags by usage count descending, newest first among equals.
    async fn list_tags(&self, owner: Uuid) -> StoreResult<Vec<Tag>>;
    async fn find_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Tag>>;
    /// Case-insensitive name lookup, optionally ignoring one tag id.
    async fn find_tag_by_name(&self, owner: Uuid, name: &str, exclude: Option<Uuid>) -> StoreResult<Option<Tag>>;
    async fn tag_summaries(&self, owner: Uuid, ids: &[Uuid]) -> StoreResult<Vec<TagSummary>>;
    /// Fails with `Conflict` when the owner already has the name (ignoring case).
    async fn insert_tag(&self, tag: NewTag) -> StoreResult<Tag>;
    async fn update_tag(&self, owner: Uuid, id: Uuid, changes: &TagChanges) -> StoreResult<Option<Tag>>;
    /// Strips the tag from the owner's contacts, then deletes it.
    async fn delete_tag(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TagDeletion>>;

    // Associations

    /// Links the tag to each owned, not yet linked contact in `contact_ids` and
    /// increments the usage count once by the number of new links. Returns the
    /// ids that were newly linked. `NotFound` when the tag is not owned.
    async fn attach_tag(&self, owner: Uuid, tag_id: Uuid, contact_ids: &[Uuid]) -> StoreResult<Vec<Uuid>>;
    /// Unlinks the pair and decrements the usage count (never below zero).
    /// Returns false when the pair was not linked.
    async fn detach_tag(&self, owner: Uuid, tag_id: Uuid, contact_id: Uuid) -> StoreResult<bool>;
}
