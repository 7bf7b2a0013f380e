// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the service index and health check.
//
// Security Level: None (completely public access)
// Middleware: None (no authentication or authorization)

pub mod auth;
pub mod root;

pub use auth::*;
pub use root::{health, root};
