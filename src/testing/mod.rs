use std::sync::Arc;

use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::database::models::{ContactView, NewUser, Tag};
use crate::database::{MemoryStore, Store};
use crate::services::{AssociationService, ContactInput, ContactService, TagInput, TagService, UserService};
use crate::state::AppState;

/// Services wired to a fresh in-memory store
pub struct TestContext {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub users: UserService,
    pub contacts: ContactService,
    pub tags: TagService,
    pub associations: AssociationService,
}

impl TestContext {
    pub fn new() -> Self {
        let config = AppConfig::development();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), &config).expect("development config builds state");

        Self {
            store,
            tokens: state.tokens.clone(),
            users: state.users.clone(),
            contacts: state.contacts.clone(),
            tags: state.tags.clone(),
            associations: state.associations.clone(),
            config,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.store.clone(), &self.config).expect("development config builds state")
    }

    /// Inserts a user directly and returns its id
    pub async fn user(&self, name: &str) -> Uuid {
        self.store
            .insert_user(NewUser {
                name: name.to_string(),
                email: format!("{}-{}@example.com", name, Uuid::new_v4().simple()),
                password_hash: "unused".to_string(),
            })
            .await
            .expect("insert test user")
            .id
    }

    pub async fn contact(&self, owner: Uuid, name: &str) -> ContactView {
        let input = ContactInput {
            name: Some(name.to_string()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: Some("555-0100".to_string()),
            is_favorite: None,
        };
        self.contacts.create(owner, input).await.expect("create test contact")
    }

    pub async fn tag(&self, owner: Uuid, name: &str) -> Tag {
        let input = TagInput {
            name: Some(name.to_string()),
            color: None,
        };
        self.tags.create(owner, input).await.expect("create test tag")
    }

    /// Bearer header value for a stored user
    pub async fn bearer(&self, user_id: Uuid) -> String {
        let user = self
            .store
            .find_user(user_id)
            .await
            .expect("find test user")
            .expect("test user exists");
        format!("Bearer {}", self.tokens.issue(&user).expect("issue token").token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_users_are_distinct() {
        let ctx = TestContext::new();
        let a = ctx.user("ada").await;
        let b = ctx.user("ada").await;
        assert_ne!(a, b);
    }
}
