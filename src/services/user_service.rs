use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::validation;
use super::{ServiceError, ServiceResult};
use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Store};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub expires_in: u64,
}

/// Registration, login and password changes
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    tokens: TokenIssuer,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> ServiceResult<User> {
        let (Some(name), Some(email), Some(password)) = (
            non_blank(input.name.as_deref()),
            non_blank(input.email.as_deref()),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ServiceError::validation("Please provide name, email and password"));
        };

        let email = normalize_email(&email)?;
        validation::password(&password)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let password_hash = hash_password(&password, self.bcrypt_cost).await?;
        let user = self
            .store
            .insert_user(NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ServiceError::DuplicateEmail,
                other => ServiceError::Database(other),
            })?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Same error for unknown email and wrong password
    pub async fn login(&self, input: LoginInput) -> ServiceResult<LoginOutcome> {
        let (Some(email), Some(password)) = (
            non_blank(input.email.as_deref()),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ServiceError::validation("Please provide email and password"));
        };
        let email = normalize_email(&email)?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!("Login attempt for unknown email {}", email);
            return Err(ServiceError::InvalidCredentials);
        };
        if !verify_password(&password, &user.password).await? {
            warn!("Wrong password for user {}", user.id);
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&user)?;
        info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            user,
            token: issued.token,
            expires_in: issued.expires_in,
        })
    }

    pub async fn update_password(&self, user_id: Uuid, input: PasswordInput) -> ServiceResult<()> {
        let (Some(current), Some(new)) = (
            input.current_password.filter(|p| !p.is_empty()),
            input.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ServiceError::validation("Please provide current and new password"));
        };
        validation::password(&new)?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        if !verify_password(&current, &user.password).await? {
            return Err(ServiceError::WrongCurrentPassword);
        }
        if current == new {
            return Err(ServiceError::SamePassword);
        }

        let password_hash = hash_password(&new, self.bcrypt_cost).await?;
        if !self.store.update_user_password(user_id, &password_hash).await? {
            return Err(ServiceError::UserNotFound);
        }

        info!("Password changed for user {}", user_id);
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Emails are stored trimmed and lowercased
fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    if !validation::is_valid_email(&email) {
        return Err(ServiceError::validation("Please provide a valid email address"));
    }
    Ok(email)
}
