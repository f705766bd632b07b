//! Form upload and retrieval endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{repo, FormDefinition, FormSummary, UploadResponse, UserFormsResponse};
use crate::schema::{self, FieldDescriptor};
use crate::token;
use crate::AppState;

use super::error::{ApiError, ErrorCode};

/// Attempts at inserting a freshly generated form id before giving up.
const FORM_ID_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub user_id: Option<i64>,
}

/// Upload a form definition from a JSON or CSV file
///
/// POST /upload?user_id=<id>
pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
            upload = Some((file_name, data.to_vec()));
            break;
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::bad_request("Missing 'file' field in multipart body"))?;

    let (name, fields) = if file_name.ends_with(".json") {
        schema::normalize_structured(&data)?
    } else if file_name.ends_with(".csv") {
        let fields = schema::normalize_table(&data, state.config.upload.empty_options_policy)?;
        // Tabular uploads carry no name of their own; use the file name.
        let name = file_name.trim_end_matches(".csv").to_string();
        (name, fields)
    } else {
        return Err(ApiError::bad_request(
            "Invalid file type. Please upload a JSON or CSV file.",
        ));
    };

    if fields.is_empty() {
        return Err(ApiError::new(
            ErrorCode::ValidationError,
            "Form must contain at least one field",
        ));
    }

    let fields_json = serde_json::to_string(&fields)
        .map_err(|e| ApiError::internal(format!("Failed to serialize fields: {e}")))?;

    // The generator does not guarantee uniqueness; on a constraint clash,
    // regenerate rather than surfacing the duplicate as a client error.
    for _ in 0..FORM_ID_INSERT_ATTEMPTS {
        let form_id = token::new_form_id();
        match repo::create_form(&state.db, &form_id, params.user_id, &name, &fields_json).await {
            Ok(_) => {
                info!(form_id = %form_id, name = %name, "Form uploaded");
                return Ok((
                    StatusCode::CREATED,
                    Json(UploadResponse {
                        message: "Form uploaded successfully".to_string(),
                        form_id,
                    }),
                ));
            }
            Err(e) if is_form_id_collision(&e) => {
                warn!(form_id = %form_id, "Form id collision, regenerating");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::conflict(
        "Could not allocate a unique form identifier",
    ))
}

fn is_form_id_collision(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.message().contains("UNIQUE constraint failed: forms.form_id")
    )
}

/// Get a form definition by its external id
///
/// GET /form/:form_id
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> Result<Json<FormDefinition>, ApiError> {
    let form = repo::find_form_by_external_id(&state.db, &form_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Form not found"))?;

    let fields: Vec<FieldDescriptor> = form
        .descriptors()
        .map_err(|e| ApiError::internal(format!("Stored form fields are unreadable: {e}")))?;

    Ok(Json(FormDefinition {
        form_id: form.form_id,
        name: form.name,
        fields,
    }))
}

/// List the forms owned by a user
///
/// GET /user/:user_id/forms
pub async fn list_user_forms(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserFormsResponse>, ApiError> {
    let forms = repo::list_forms_by_owner(&state.db, user_id).await?;

    if forms.is_empty() {
        return Err(ApiError::not_found("No forms found for this user"));
    }

    Ok(Json(UserFormsResponse {
        user_id,
        forms: forms.into_iter().map(FormSummary::from).collect(),
    }))
}
