// handlers/mod.rs - 2-Tier Handler Architecture
//
// Public (no auth) → Protected (bearer JWT auth)
//
// Protected handlers receive the caller as `Extension<AuthUser>` and pass
// its id to the services as the owner of every contact and tag they touch.
pub mod extract;
pub mod protected; // Tier 2: JWT authentication required (/auth/update-password, /user/*)
pub mod public; // Tier 1: No authentication required (/, /health, /auth/*)

pub use extract::{ApiJson, ApiPath};
