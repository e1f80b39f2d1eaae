use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{Collection, CreatePatientRequest, PatientRecord, SortQuery, UpdatePatientRequest};
use crate::services::PatientService;

pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "Patient Management System API" }))
}

pub async fn about() -> Json<Value> {
    Json(json!({
        "message": "A full-featured Patient Management System API built to handle patient records"
    }))
}

#[axum::debug_handler]
pub async fn view_patients(
    State(service): State<Arc<PatientService>>,
) -> Result<Json<Collection>, AppError> {
    let patients = service.list_patients().await?;

    Ok(Json(patients))
}

#[axum::debug_handler]
pub async fn view_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientRecord>, AppError> {
    let patient = service.get_patient(&patient_id).await?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn sort_patients(
    State(service): State<Arc<PatientService>>,
    WithRejection(Query(query), _): WithRejection<Query<SortQuery>, AppError>,
) -> Result<Json<Vec<PatientRecord>>, AppError> {
    let patients = service
        .sort_patients(&query.sort_by, query.order.as_deref())
        .await?;

    Ok(Json(patients))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    WithRejection(Json(request), _): WithRejection<Json<CreatePatientRequest>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    service.create_patient(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Patient record created successfully" })),
    ))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<UpdatePatientRequest>, AppError>,
) -> Result<Json<Value>, AppError> {
    service.update_patient(&patient_id, request).await?;

    Ok(Json(json!({ "message": "Patient record updated successfully" })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    service.delete_patient(&patient_id).await?;

    Ok(Json(json!({ "message": "Patient record deleted successfully" })))
}
