//! Response submission and listing endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::db::{repo, ResponseListing, SubmitRequest, SubmitResponse};
use crate::AppState;

use super::error::ApiError;

/// Submit a response to a form
///
/// POST /form/:form_id/submit
pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let form = repo::find_form_by_external_id(&state.db, &form_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Form not found"))?;

    let data_json = serde_json::to_string(&req.data)
        .map_err(|e| ApiError::internal(format!("Failed to serialize response data: {e}")))?;

    let response_id = repo::create_response(&state.db, form.id, &data_json)
        .await
        .map_err(|e| match e {
            // Form vanished between lookup and insert
            sqlx::Error::RowNotFound => ApiError::not_found("Form not found"),
            other => other.into(),
        })?;

    info!(form_id = %form_id, response_id, "Response submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Response submitted successfully".to_string(),
            response_id,
        }),
    ))
}

/// List the responses submitted to a form
///
/// GET /form/:form_id/responses
pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> Result<Json<ResponseListing>, ApiError> {
    let form = repo::find_form_by_external_id(&state.db, &form_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Form not found"))?;

    let rows = repo::list_responses_by_form(&state.db, form.id).await?;

    let responses = rows
        .into_iter()
        .map(|row| serde_json::from_str(&row.data))
        .collect::<Result<Vec<serde_json::Value>, _>>()
        .map_err(|e| ApiError::internal(format!("Stored response data is unreadable: {e}")))?;

    Ok(Json(ResponseListing {
        form_id: form.form_id,
        responses,
    }))
}
