use crate::error::PatientError;
use crate::models::{Collection, PatientRecord, SortField, SortOrder};

/// Parses the raw `sort_by` / `order` query values. A missing order means
/// ascending.
pub fn parse_sort_params(
    sort_by: &str,
    order: Option<&str>,
) -> Result<(SortField, SortOrder), PatientError> {
    let field = sort_by.parse::<SortField>()?;
    let order = order.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default();
    Ok((field, order))
}

/// Orders every record by `field`.
///
/// The sort is stable in both directions: records with equal keys keep their
/// collection order. IDs are not part of the output.
pub fn sort_records(collection: &Collection, field: SortField, order: SortOrder) -> Vec<PatientRecord> {
    let mut keyed: Vec<(f64, PatientRecord)> = collection
        .records()
        .map(|record| (field.key(record), record.clone()))
        .collect();

    match order {
        SortOrder::Asc => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
        SortOrder::Desc => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
    }

    keyed.into_iter().map(|(_, record)| record).collect()
}
