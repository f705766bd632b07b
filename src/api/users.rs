//! User registration and lookup endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::db::{repo, RegisterRequest, RegisterResponse, UserIdResponse};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};

/// Register a new user
///
/// POST /register
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.provider_id.trim().is_empty() {
        errors.add("provider_id", "Provider id is required");
    }
    if req.email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    errors.finish()?;

    // The unique constraint below backstops concurrent registrations.
    if repo::find_user_by_provider_id(&state.db, &req.provider_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("User already registered"));
    }

    let user_id = repo::create_user(&state.db, &req.provider_id, &req.email)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
                ApiError::conflict("User already registered")
            }
            _ => ApiError::from(e),
        })?;

    info!(user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id,
        }),
    ))
}

/// Resolve an auth-provider id to the internal user id
///
/// GET /user/:provider_id
pub async fn get_user_id(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let user = repo::find_user_by_provider_id(&state.db, &provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserIdResponse { user_id: user.id }))
}
