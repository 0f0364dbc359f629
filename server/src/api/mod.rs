//! HTTP API
//!
//! Routes:
//! - `users`: the user resource (`/api/users`)
//! - `files`: public disk access (`/storage/{name}`)
//! - `/health`: liveness probe

pub mod files;
pub mod form;
pub mod users;

use crate::app::AppState;
use crate::config::MAX_REQUEST_BODY_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

async fn health_check() -> Json<Value> {
    Json(json!({ "status": 200 }))
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            get(users::show_user)
                .put(users::update_user)
                .patch(users::update_user)
                .post(users::update_user)
                .delete(users::delete_user),
        );

    let file_routes = Router::new().route("/storage/{name}", get(files::serve_image));

    Router::new()
        .route("/health", get(health_check))
        .merge(user_routes)
        .merge(file_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
