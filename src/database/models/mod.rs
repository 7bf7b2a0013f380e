pub mod contact;
pub mod tag;
pub mod user;

pub use contact::{Contact, ContactChanges, ContactFilter, ContactSummary, ContactView, NewContact};
pub use tag::{NewTag, Tag, TagChanges, TagDeletion, TagInfo, TagSummary, DEFAULT_TAG_COLOR};
pub use user::{NewUser, User};
