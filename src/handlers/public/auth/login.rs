// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;

use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginInput, LoginOutcome};
use crate::state::AppState;

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Input: `{"email": "...", "password": "..."}`
///
/// Output: `{success, message, data: {user, token, expiresIn}}`. Unknown
/// email and wrong password both answer 401 INVALID_CREDENTIALS.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<LoginOutcome> {
    let outcome = state.users.login(input).await?;
    Ok(ApiResponse::success(outcome).message("Login successful"))
}
