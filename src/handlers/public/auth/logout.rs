use crate::middleware::{ApiResponse, ApiResult};

/// POST /auth/logout - Tokens are stateless, so the client just drops its copy
pub async fn logout_post() -> ApiResult<()> {
    Ok(ApiResponse::message_only(
        "Logged out successfully. Please discard your token.",
    ))
}
