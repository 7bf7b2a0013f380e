use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router: public routes, JWT-protected routes, global layers
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .merge(password_routes())
        .merge(contact_routes())
        .merge(favorite_routes())
        .merge(tag_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/logout", post(auth::logout_post))
}

fn password_routes() -> Router<AppState> {
    use protected::auth;

    Router::new().route("/auth/update-password", put(auth::update_password_put))
}

fn contact_routes() -> Router<AppState> {
    use protected::contacts;

    Router::new()
        .route("/user/contacts", get(contacts::contacts_get).post(contacts::contacts_post))
        .route(
            "/user/contacts/:id",
            put(contacts::contact_put).delete(contacts::contact_delete),
        )
}

fn favorite_routes() -> Router<AppState> {
    use protected::favorites;

    Router::new()
        .route("/user/favorites", get(favorites::favorites_get))
        .route(
            "/user/favorites/:id",
            put(favorites::favorite_put).delete(favorites::favorite_delete),
        )
}

fn tag_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::tags;

    Router::new()
        // Tag registry
        .route("/user/tags", get(tags::tags_get).post(tags::tags_post))
        .route("/user/tags/:id", put(tags::tag_put).delete(tags::tag_delete))
        // Tag/contact associations
        .route(
            "/user/tags/:id/contacts",
            get(tags::tag_contacts_get).post(tags::tag_contacts_post),
        )
        .route("/user/tags/:id/contacts/bulk", post(tags::tag_contacts_bulk_post))
        .route("/user/tags/:id/contacts/:contact_id", delete(tags::tag_contact_delete))
        .route("/user/tags/:id/available-contacts", get(tags::tag_available_contacts_get))
}

/// Explicit origins when configured, any origin otherwise
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
