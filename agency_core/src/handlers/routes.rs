//! Route table

use crate::{
    handlers::{auth, contacts, employees, health, storage},
    middleware::auth::{jwt_auth_middleware, require_admin},
    websocket::websocket_handler,
    AppState,
};
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/api/contact", post(contacts::submit_contact))
        .route("/api/employees/verify/:employee_id", get(employees::verify_employee))
        .route("/api/images/*key", get(storage::image_redirect))
        .route("/api/storage/upload", put(storage::upload_object))
        .route("/api/storage/objects/*key", get(storage::download_object))
        .route(&state.config.websocket.path, get(websocket_handler))
        .nest("/api/auth", auth::create_auth_routes(state.clone()))
        .nest("/api/admin", admin_routes(state.clone()))
}

/// Everything under `/api/admin` needs a staff token; deletions need the admin role.
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/contacts", get(contacts::list_contacts))
        .route("/contacts/unread-count", get(contacts::unread_count))
        .route("/contacts/:id", get(contacts::get_contact))
        .route("/contacts/:id/status", patch(contacts::update_contact_status))
        .route("/contacts/:id/read", patch(contacts::mark_contact_read))
        .route(
            "/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/employees/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .merge(delete(employees::delete_employee).route_layer(middleware::from_fn(require_admin))),
        )
        .route("/verification-stats", get(employees::verification_stats))
        .route("/storage/upload-url", post(storage::create_upload_url))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}
