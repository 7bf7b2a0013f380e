// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::State;

use crate::database::models::User;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterInput;
use crate::state::AppState;

/// POST /auth/register - Create a new account
///
/// Input: `{"name": "...", "email": "...", "password": "..."}`. The email is
/// stored lowercased; the password must be at least 6 characters.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<User> {
    let user = state.users.register(input).await?;
    Ok(ApiResponse::created(user).message("User registered successfully"))
}
