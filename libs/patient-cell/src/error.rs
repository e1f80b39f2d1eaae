use shared_models::error::AppError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatientError {
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Patient not found: {0}")]
    RecordNotFound(String),

    #[error("Patient ID already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid sort field '{0}', select from [height, weight, bmi]")]
    InvalidSortField(String),

    #[error("Invalid sort order '{0}', select between asc and desc")]
    InvalidSortOrder(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl PatientError {
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        PatientError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        let message = error.to_string();
        match error {
            PatientError::InvalidField { .. } => AppError::ValidationError(message),
            PatientError::RecordNotFound(_) => AppError::NotFound(message),
            PatientError::DuplicateId(_)
            | PatientError::InvalidSortField(_)
            | PatientError::InvalidSortOrder(_) => AppError::BadRequest(message),
            PatientError::Storage(_) => AppError::Internal(message),
        }
    }
}
