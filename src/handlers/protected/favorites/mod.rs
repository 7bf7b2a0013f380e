use axum::extract::{Extension, State};
use uuid::Uuid;

use crate::database::models::ContactView;
use crate::handlers::ApiPath;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /user/favorites
pub async fn favorites_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<ContactView>> {
    let contacts = state.contacts.list_favorites(user.id).await?;
    let count = contacts.len();
    Ok(ApiResponse::success(contacts).count(count))
}

/// PUT /user/favorites/:id - Mark as favorite (idempotent)
pub async fn favorite_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ContactView> {
    let contact = state.contacts.set_favorite(user.id, id, true).await?;
    Ok(ApiResponse::success(contact).message("Contact added to favorites successfully"))
}

/// DELETE /user/favorites/:id - Unmark (idempotent)
pub async fn favorite_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ContactView> {
    let contact = state.contacts.set_favorite(user.id, id, false).await?;
    Ok(ApiResponse::success(contact).message("Contact removed from favorites successfully"))
}
