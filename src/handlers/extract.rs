// handlers/extract.rs - Extractors that reject with the API error envelope
//
// axum's own `Json` and `Path` reject with plain-text bodies. These wrappers
// route the rejection through `ApiError` so malformed bodies answer
// 400 INVALID_JSON and malformed ids answer 400 INVALID_ID.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
