// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Middleware: `jwt_auth_middleware` validates the token, confirms the user
// still exists and injects `AuthUser`. Every handler scopes its work to
// `AuthUser.id`; records of other users answer 404 exactly like missing ones.

pub mod auth; // PUT /auth/update-password
pub mod contacts; // /user/contacts
pub mod favorites; // /user/favorites
pub mod tags; // /user/tags and tag/contact links
