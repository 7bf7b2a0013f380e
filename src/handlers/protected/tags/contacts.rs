// handlers/protected/tags/contacts.rs - Tag/contact association endpoints
//
// GET    /user/tags/:id/contacts                 contacts carrying the tag
// POST   /user/tags/:id/contacts                 link one contact
// POST   /user/tags/:id/contacts/bulk            link many contacts
// DELETE /user/tags/:id/contacts/:contactId      unlink
// GET    /user/tags/:id/available-contacts       contacts without the tag

use axum::extract::{Extension, State};
use uuid::Uuid;

use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::association_service::{AvailableContacts, TaggedContacts};
use crate::services::{AssociationService, BulkLinkInput, BulkLinkReport, LinkInput, LinkOutcome};
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(tag_id): ApiPath<Uuid>,
) -> ApiResult<TaggedContacts> {
    let tagged = state.associations.contacts_by_tag(user.id, tag_id).await?;
    let message = format!("Contacts with tag \"{}\"", tagged.tag.name);
    let count = tagged.contacts.len();
    Ok(ApiResponse::success(tagged).message(message).count(count))
}

/// Input: `{"contactId": "..."}`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(tag_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LinkInput>,
) -> ApiResult<LinkOutcome> {
    let contact_id = AssociationService::contact_id(&input)?;
    let outcome = state.associations.link(user.id, tag_id, contact_id).await?;
    let message = format!("Tag \"{}\" added to contact successfully", outcome.tag.name);
    Ok(ApiResponse::success(outcome).message(message))
}

/// Input: `{"contactIds": ["...", ...]}`
pub async fn bulk_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(tag_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<BulkLinkInput>,
) -> ApiResult<BulkLinkReport> {
    let report = state.associations.bulk_link(user.id, tag_id, input).await?;
    let message = format!("Tag \"{}\" added to {} contacts", report.tag.name, report.added_count);
    Ok(ApiResponse::success(report).message(message))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((tag_id, contact_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<LinkOutcome> {
    let outcome = state.associations.unlink(user.id, tag_id, contact_id).await?;
    let message = format!("Tag \"{}\" removed from contact successfully", outcome.tag.name);
    Ok(ApiResponse::success(outcome).message(message))
}

pub async fn available_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(tag_id): ApiPath<Uuid>,
) -> ApiResult<AvailableContacts> {
    let available = state.associations.contacts_not_in_tag(user.id, tag_id).await?;
    let count = available.contacts.len();
    Ok(ApiResponse::success(available).count(count))
}
