pub mod association_service;
pub mod contact_service;
pub mod tag_service;
pub mod user_service;
pub mod validation;

use std::collections::HashMap;

use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::database::DatabaseError;

pub use association_service::{AssociationService, BulkLinkInput, BulkLinkReport, LinkInput, LinkOutcome};
pub use contact_service::{ContactInput, ContactService};
pub use tag_service::{TagInput, TagService};
pub use user_service::{LoginInput, LoginOutcome, PasswordInput, RegisterInput, UserService};

/// Domain outcomes of the contact, tag and user services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    #[error("The provided ID is not valid")]
    InvalidId,

    // Contacts
    #[error("No contacts found")]
    NoContacts,
    #[error("No favorite contacts found")]
    NoFavorites,
    #[error("The contact with the specified ID does not exist")]
    ContactNotFound,

    // Tags
    #[error("No tags found")]
    NoTags,
    #[error("The tag with the specified ID does not exist")]
    TagNotFound,
    #[error("A tag named \"{0}\" already exists for this user")]
    DuplicateTag(String),

    // Associations
    #[error("No contacts found with tag \"{tag_name}\"")]
    NoContactsForTag { tag_name: String },
    #[error("None of the provided contact IDs match your contacts")]
    NoMatchingContacts,
    #[error("This contact already has this tag")]
    AlreadyAssigned,
    #[error("This contact doesn't have this tag")]
    NotAssigned,

    // Users
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User account not found")]
    UserNotFound,
    #[error("Current password is incorrect")]
    WrongCurrentPassword,
    #[error("New password must be different from current password")]
    SamePassword,

    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn invalid_fields(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
