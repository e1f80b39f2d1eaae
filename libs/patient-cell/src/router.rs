use std::sync::Arc;
use axum::{routing::{delete, get, post, put}, Router};

use crate::handlers::*;
use crate::services::PatientService;

pub fn create_patient_router(service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/about", get(about))
        .route("/view", get(view_patients))
        .route("/patient/{patient_id}", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/{patient_id}", put(update_patient))
        .route("/delete/{patient_id}", delete(delete_patient))
        .with_state(service)
}
