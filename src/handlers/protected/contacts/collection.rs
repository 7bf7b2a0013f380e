use axum::extract::{Extension, State};

use crate::database::models::ContactView;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ContactInput;
use crate::state::AppState;

/// GET /user/contacts - All of the caller's contacts, oldest first
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<ContactView>> {
    let contacts = state.contacts.list(user.id).await?;
    let count = contacts.len();
    Ok(ApiResponse::success(contacts).count(count))
}

/// POST /user/contacts - Create a contact
///
/// Input: `{"name", "email", "phone", "isFavorite"?}`. Tags are attached
/// through the tag endpoints, never here.
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<ContactInput>,
) -> ApiResult<ContactView> {
    let contact = state.contacts.create(user.id, input).await?;
    Ok(ApiResponse::created(contact).message("Contact created successfully"))
}
