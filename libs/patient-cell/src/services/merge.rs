use crate::error::PatientError;
use crate::models::{PatientRecord, PatientUpdate, RecordFields};
use crate::services::validation;

/// Applies `update` on top of `existing`.
///
/// Provided fields overwrite, everything else is kept. The merged values are
/// validated again as a full record, and since BMI and verdict are derived
/// from the result they always reflect the merged measurements.
pub fn merge_update(
    existing: &PatientRecord,
    update: PatientUpdate,
) -> Result<PatientRecord, PatientError> {
    let fields = RecordFields {
        name: update.name.unwrap_or_else(|| existing.name.clone()),
        city: update.city.unwrap_or_else(|| existing.city.clone()),
        age: i64::from(update.age.unwrap_or(existing.age)),
        gender: update.gender.unwrap_or(existing.gender).as_str().to_string(),
        height: update.height.unwrap_or(existing.height),
        weight: update.weight.unwrap_or(existing.weight),
    };

    validation::validate_record(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Patch, UpdatePatientRequest, Verdict};
    use crate::services::validation::{validate_record, validate_update};

    fn john() -> PatientRecord {
        validate_record(RecordFields {
            name: "John Doe".to_string(),
            city: "New York".to_string(),
            age: 30,
            gender: "Male".to_string(),
            height: 1.75,
            weight: 70.2,
        })
        .unwrap()
    }

    fn update(request: UpdatePatientRequest) -> PatientUpdate {
        validate_update(request).unwrap()
    }

    #[test]
    fn test_empty_update_is_noop() {
        let existing = john();
        let merged = merge_update(&existing, PatientUpdate::default()).unwrap();
        assert_eq!(merged, existing);
        assert_eq!(merged.bmi(), existing.bmi());
        assert_eq!(merged.verdict(), existing.verdict());
    }

    #[test]
    fn test_name_only_keeps_derived_values() {
        let existing = john();
        let merged = merge_update(
            &existing,
            update(UpdatePatientRequest {
                name: Patch::Value("Johnny".to_string()),
                ..Default::default()
            }),
        )
        .unwrap();

        assert_eq!(merged.name(), "Johnny");
        assert_eq!(merged.city(), "New York");
        assert_eq!(merged.bmi(), 22.92);
        assert_eq!(merged.verdict(), Verdict::NormalWeight);
    }

    #[test]
    fn test_weight_change_recomputes() {
        let merged = merge_update(
            &john(),
            update(UpdatePatientRequest {
                weight: Patch::Value(95.0),
                ..Default::default()
            }),
        )
        .unwrap();

        // 95 / 1.75² = 31.02
        assert_eq!(merged.bmi(), 31.02);
        assert_eq!(merged.verdict(), Verdict::Obesity);
        assert_eq!(merged.height(), 1.75);
    }

    #[test]
    fn test_merge_rejects_unbounded_bmi() {
        let existing = john();
        let result = merge_update(
            &existing,
            update(UpdatePatientRequest {
                height: Patch::Value(1e-200),
                ..Default::default()
            }),
        );

        assert_eq!(
            result.unwrap_err(),
            PatientError::invalid_field("height", "too small relative to weight to derive a BMI")
        );
    }

    #[test]
    fn test_height_change_recomputes() {
        let merged = merge_update(
            &john(),
            update(UpdatePatientRequest {
                height: Patch::Value(2.0),
                gender: Patch::Value("others".to_string()),
                ..Default::default()
            }),
        )
        .unwrap();

        // 70.2 / 4 = 17.55
        assert_eq!(merged.bmi(), 17.55);
        assert_eq!(merged.verdict(), Verdict::Underweight);
        assert_eq!(merged.gender(), Gender::Others);
        assert_eq!(merged.age(), 30);
    }
}
