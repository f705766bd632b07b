//! Form model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::schema::FieldDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Form {
    pub id: i64,
    /// Short public-facing identifier, distinct from the internal id.
    pub form_id: String,
    pub user_id: Option<i64>,
    pub name: String,
    /// JSON array of field descriptors (stored as TEXT)
    pub fields: String,
    pub created_at: String,
}

impl Form {
    /// Parse the stored field descriptors.
    pub fn descriptors(&self) -> Result<Vec<FieldDescriptor>, serde_json::Error> {
        serde_json::from_str(&self.fields)
    }
}

/// Full form definition as served to clients.
#[derive(Debug, Serialize)]
pub struct FormDefinition {
    pub form_id: String,
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

/// One row of a per-user form listing.
#[derive(Debug, Serialize)]
pub struct FormSummary {
    pub id: i64,
    pub name: String,
    pub form_id: String,
}

impl From<Form> for FormSummary {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            name: form.name,
            form_id: form.form_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserFormsResponse {
    pub user_id: i64,
    pub forms: Vec<FormSummary>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub form_id: String,
}
