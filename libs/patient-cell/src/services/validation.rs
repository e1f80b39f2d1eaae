//! Record validation and input normalization.
//!
//! Every way into a `PatientRecord` or a `PatientUpdate` goes through here:
//! create requests, partial updates, merged records and records read back
//! from storage.

use crate::error::PatientError;
use crate::models::{
    CreatePatientRequest, Gender, Patch, Patient, PatientRecord, PatientUpdate, RecordFields,
    UpdatePatientRequest,
};

const MAX_AGE_EXCLUSIVE: i64 = 110;

/// Upper-cases the first character and lower-cases the rest, then checks the
/// result against the accepted genders.
pub fn normalize_gender(raw: &str) -> Result<Gender, PatientError> {
    let normalized = capitalize(raw);
    Gender::ALL
        .into_iter()
        .find(|gender| gender.as_str() == normalized)
        .ok_or_else(|| {
            PatientError::invalid_field(
                "gender",
                format!("'{}' is not one of Male, Female, Others", raw),
            )
        })
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn validate_text(field: &str, value: String) -> Result<String, PatientError> {
    if value.trim().is_empty() {
        return Err(PatientError::invalid_field(field, "must not be empty"));
    }
    Ok(value)
}

pub fn validate_age(age: i64) -> Result<u32, PatientError> {
    if age <= 0 {
        return Err(PatientError::invalid_field("age", "must be greater than 0"));
    }
    if age >= MAX_AGE_EXCLUSIVE {
        return Err(PatientError::invalid_field(
            "age",
            format!("must be less than {}", MAX_AGE_EXCLUSIVE),
        ));
    }
    u32::try_from(age).map_err(|_| PatientError::invalid_field("age", "out of range"))
}

/// Height and weight must be finite and strictly positive.
pub fn validate_measurement(field: &str, value: f64) -> Result<f64, PatientError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PatientError::invalid_field(field, "must be greater than 0"));
    }
    Ok(value)
}

pub fn validate_patient_id(id: String) -> Result<String, PatientError> {
    validate_text("id", id)
}

/// Full-record validation. All six stored attributes are required.
pub fn validate_record(fields: RecordFields) -> Result<PatientRecord, PatientError> {
    let record = PatientRecord {
        name: validate_text("name", fields.name)?,
        city: validate_text("city", fields.city)?,
        age: validate_age(fields.age)?,
        gender: normalize_gender(&fields.gender)?,
        height: validate_measurement("height", fields.height)?,
        weight: validate_measurement("weight", fields.weight)?,
    };

    // Extreme but positive measurements can still overflow weight / height².
    if !record.bmi().is_finite() {
        return Err(PatientError::invalid_field(
            "height",
            "too small relative to weight to derive a BMI",
        ));
    }

    Ok(record)
}

pub fn validate_new_patient(request: CreatePatientRequest) -> Result<Patient, PatientError> {
    let (id, fields) = request.into_parts();
    let id = validate_patient_id(id)?;
    let record = validate_record(fields)?;
    Ok(Patient { id, record })
}

fn provided<T>(field: &str, patch: Patch<T>) -> Result<Option<T>, PatientError> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(PatientError::invalid_field(field, "must not be null")),
        Patch::Value(value) => Ok(Some(value)),
    }
}

/// Validates each provided field with the same rule as the full record.
pub fn validate_update(request: UpdatePatientRequest) -> Result<PatientUpdate, PatientError> {
    Ok(PatientUpdate {
        name: provided("name", request.name)?
            .map(|name| validate_text("name", name))
            .transpose()?,
        city: provided("city", request.city)?
            .map(|city| validate_text("city", city))
            .transpose()?,
        age: provided("age", request.age)?.map(validate_age).transpose()?,
        gender: provided("gender", request.gender)?
            .map(|gender| normalize_gender(&gender))
            .transpose()?,
        height: provided("height", request.height)?
            .map(|height| validate_measurement("height", height))
            .transpose()?,
        weight: provided("weight", request.weight)?
            .map(|weight| validate_measurement("weight", weight))
            .transpose()?,
    })
}
