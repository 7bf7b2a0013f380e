use axum::extract::{Extension, State};

use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::PasswordInput;
use crate::state::AppState;

/// PUT /auth/update-password - Change the caller's password
///
/// Input: `{"currentPassword": "...", "newPassword": "..."}`
pub async fn update_password_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<PasswordInput>,
) -> ApiResult<()> {
    state.users.update_password(user.id, input).await?;
    Ok(ApiResponse::message_only("Password updated successfully"))
}
