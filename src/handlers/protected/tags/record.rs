use axum::extract::{Extension, State};
use uuid::Uuid;

use crate::database::models::{Tag, TagDeletion};
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::TagInput;
use crate::state::AppState;

/// PUT /user/tags/:id - Rename and/or recolor
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<TagInput>,
) -> ApiResult<Tag> {
    let tag = state.tags.update(user.id, id, input).await?;
    Ok(ApiResponse::success(tag).message("Tag updated successfully"))
}

/// DELETE /user/tags/:id - Detaches the tag from all contacts, then removes it
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<TagDeletion> {
    let deletion = state.tags.delete(user.id, id).await?;
    let message = format!(
        "Tag \"{}\" deleted and removed from {} contacts",
        deletion.tag.name, deletion.detached_contacts
    );
    Ok(ApiResponse::success(deletion).message(message))
}
