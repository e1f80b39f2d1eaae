use std::sync::Arc;

use axum::Router;

use patient_cell::create_patient_router;
use patient_cell::services::PatientService;

pub fn create_router(patients: Arc<PatientService>) -> Router {
    Router::new()
        .merge(create_patient_router(patients))
}
