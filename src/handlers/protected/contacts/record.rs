use axum::extract::{Extension, State};
use uuid::Uuid;

use crate::database::models::ContactView;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ContactInput;
use crate::state::AppState;

/// PUT /user/contacts/:id - Partial update; `createdBy`, `tags` and `id` in the body are ignored
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ContactInput>,
) -> ApiResult<ContactView> {
    let contact = state.contacts.update(user.id, id, input).await?;
    Ok(ApiResponse::success(contact).message("Contact updated successfully"))
}

/// DELETE /user/contacts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ContactView> {
    let contact = state.contacts.delete(user.id, id).await?;
    Ok(ApiResponse::success(contact).message("Contact deleted successfully"))
}
