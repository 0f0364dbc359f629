//! User resource handlers
//!
//! Thin wrappers over [`UsersService`](crate::services::UsersService) that
//! shape its results into the JSON envelopes clients expect.

use super::form::read_user_form;
use crate::app::AppState;
use crate::error::{AppError, Result};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

/// Identifiers that are not integers cannot name a stored user
fn parse_id(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| AppError::UserNotFound)
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>> {
    let users = state.users_service.list_users().await?;

    Ok(Json(json!({ "status": 200, "users": users })))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let form = read_user_form(multipart).await?;
    state.users_service.create_user(form).await?;

    Ok(Json(json!({ "status": 200, "message": "User created successfully!" })))
}

/// GET /api/users/{id}
pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = state.users_service.get_user(parse_id(&id)?).await?;

    Ok(Json(json!({ "status": 200, "user": user })))
}

/// PUT / PATCH / POST /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let form = read_user_form(multipart).await?;
    // Validation runs before the id is resolved, so a malformed form on an
    // unknown id still reports its field errors
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => {
            state.users_service.check_update_form(form)?;
            return Err(e);
        }
    };
    state.users_service.update_user(id, form).await?;

    Ok(Json(json!({ "status": 200, "message": "User updated successfully!" })))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.users_service.delete_user(parse_id(&id)?).await?;

    Ok(Json(json!({ "status": 200, "message": "User deleted successfully!" })))
}
