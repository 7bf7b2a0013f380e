use axum::extract::{Extension, State};

use crate::database::models::Tag;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::TagInput;
use crate::state::AppState;

/// GET /user/tags - Most used first, newest first among equals
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Tag>> {
    let tags = state.tags.list(user.id).await?;
    let count = tags.len();
    Ok(ApiResponse::success(tags).count(count))
}

/// POST /user/tags - Input: `{"name", "color"?}`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<TagInput>,
) -> ApiResult<Tag> {
    let tag = state.tags.create(user.id, input).await?;
    Ok(ApiResponse::created(tag).message("Tag created successfully"))
}
