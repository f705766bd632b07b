pub mod error;
mod forms;
mod responses;
mod users;


use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // The service sits behind a browser frontend on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(users::register_user))
        .route("/upload", post(forms::upload_form))
        .route("/form/:form_id", get(forms::get_form))
        .route("/form/:form_id/submit", post(responses::submit_response))
        .route("/form/:form_id/responses", get(responses::list_responses))
        // Same param name in both routes; the first resolves a provider id,
        // the second takes the internal numeric id.
        .route("/user/:user_id", get(users::get_user_id))
        .route("/user/:user_id/forms", get(forms::list_user_forms))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
