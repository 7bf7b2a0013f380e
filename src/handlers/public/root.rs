use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Welcome message and endpoint index
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Welcome to the Contact Manager API",
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health",
                "auth": {
                    "register": "POST /auth/register",
                    "login": "POST /auth/login",
                    "logout": "POST /auth/logout",
                    "update_password": "PUT /auth/update-password (requires JWT)"
                },
                "contacts": {
                    "list_create": "GET|POST /user/contacts (requires JWT)",
                    "update_delete": "PUT|DELETE /user/contacts/:id (requires JWT)"
                },
                "favorites": {
                    "list": "GET /user/favorites (requires JWT)",
                    "set_unset": "PUT|DELETE /user/favorites/:id (requires JWT)"
                },
                "tags": {
                    "list_create": "GET|POST /user/tags (requires JWT)",
                    "update_delete": "PUT|DELETE /user/tags/:id (requires JWT)",
                    "contacts": "GET|POST /user/tags/:id/contacts (requires JWT)",
                    "bulk": "POST /user/tags/:id/contacts/bulk (requires JWT)",
                    "unlink": "DELETE /user/tags/:id/contacts/:contactId (requires JWT)",
                    "available": "GET /user/tags/:id/available-contacts (requires JWT)"
                }
            }
        }
    }))
}

/// GET /health - Reports whether the store answers
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "store": "connected" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "SERVICE_UNAVAILABLE",
                    "message": "Store is not reachable"
                })),
            )
        }
    }
}
