use std::sync::Arc;

use crate::auth::{JwtError, TokenIssuer};
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{AssociationService, ContactService, TagService, UserService};

/// Shared by every request handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub users: UserService,
    pub contacts: ContactService,
    pub tags: TagService,
    pub associations: AssociationService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Result<Self, JwtError> {
        let tokens = TokenIssuer::new(&config.security)?;

        Ok(Self {
            users: UserService::new(store.clone(), tokens.clone(), config.security.bcrypt_cost),
            contacts: ContactService::new(store.clone()),
            tags: TagService::new(store.clone()),
            associations: AssociationService::new(store.clone()),
            tokens,
            store,
        })
    }
}
