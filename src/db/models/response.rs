//! Submitted response model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormResponse {
    pub id: i64,
    /// Internal id of the owning form.
    pub form_id: i64,
    /// JSON payload as submitted (stored as TEXT)
    pub data: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub response_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ResponseListing {
    pub form_id: String,
    pub responses: Vec<serde_json::Value>,
}
