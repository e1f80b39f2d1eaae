use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::PatientError;
use crate::services::{derivation, validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Others];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Others => "Others",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight classification derived from a BMI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obesity,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::NormalWeight => "Normal weight",
            Verdict::Overweight => "Overweight",
            Verdict::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated patient record, without its ID.
///
/// Only the stored attributes live here. `bmi()` and `verdict()` are derived
/// on demand and are written out alongside the stored fields whenever the
/// record is serialized. Deserializing a record runs full validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersistedPatient", into = "PersistedPatient")]
pub struct PatientRecord {
    pub(crate) name: String,
    pub(crate) city: String,
    pub(crate) age: u32,
    pub(crate) gender: Gender,
    pub(crate) height: f64,
    pub(crate) weight: f64,
}

impl PatientRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> f64 {
        derivation::compute_bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        derivation::classify(self.bmi())
    }
}

/// A patient record together with the ID it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: String,
    pub record: PatientRecord,
}

/// Unvalidated values for every stored attribute of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

/// On-disk shape of a record: stored fields plus the cached derived values.
/// The cached values are never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPatient {
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    #[serde(default, skip_deserializing)]
    pub bmi: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub verdict: Option<Verdict>,
}

impl From<PersistedPatient> for RecordFields {
    fn from(persisted: PersistedPatient) -> Self {
        Self {
            name: persisted.name,
            city: persisted.city,
            age: persisted.age,
            gender: persisted.gender,
            height: persisted.height,
            weight: persisted.weight,
        }
    }
}

impl TryFrom<PersistedPatient> for PatientRecord {
    type Error = PatientError;

    fn try_from(persisted: PersistedPatient) -> Result<Self, Self::Error> {
        validation::validate_record(persisted.into())
    }
}

impl From<PatientRecord> for PersistedPatient {
    fn from(record: PatientRecord) -> Self {
        let bmi = record.bmi();
        let verdict = record.verdict();
        Self {
            name: record.name,
            city: record.city,
            age: i64::from(record.age),
            gender: record.gender.as_str().to_string(),
            height: record.height,
            weight: record.weight,
            bmi: Some(bmi),
            verdict: Some(verdict),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

impl CreatePatientRequest {
    pub fn into_parts(self) -> (String, RecordFields) {
        let fields = RecordFields {
            name: self.name,
            city: self.city,
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
        };
        (self.id, fields)
    }
}

/// A field of a partial update: left out of the request, sent as `null`,
/// or sent with a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub city: Patch<String>,
    #[serde(default)]
    pub age: Patch<i64>,
    #[serde(default)]
    pub gender: Patch<String>,
    #[serde(default)]
    pub height: Patch<f64>,
    #[serde(default)]
    pub weight: Patch<f64>,
}

/// A validated partial update. `None` means the field was not provided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientUpdate {
    pub(crate) name: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) age: Option<u32>,
    pub(crate) gender: Option<Gender>,
    pub(crate) height: Option<f64>,
    pub(crate) weight: Option<f64>,
}

impl PatientUpdate {
    pub fn provided_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.city.is_some() {
            fields.push("city");
        }
        if self.age.is_some() {
            fields.push("age");
        }
        if self.gender.is_some() {
            fields.push("gender");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.weight.is_some() {
            fields.push("weight");
        }
        fields
    }

    pub fn touches_measurements(&self) -> bool {
        self.height.is_some() || self.weight.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub fn key(&self, record: &PatientRecord) -> f64 {
        match self {
            SortField::Height => record.height(),
            SortField::Weight => record.weight(),
            SortField::Bmi => record.bmi(),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            "bmi" => Ok(SortField::Bmi),
            other => Err(PatientError::InvalidSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PatientError::InvalidSortOrder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SortQuery {
    pub sort_by: String,
    pub order: Option<String>,
}

/// Every stored patient, keyed by ID.
///
/// Iteration follows the order entries were read from the persisted document,
/// then the order new entries were inserted. `index` maps each ID to its slot
/// in `entries`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    entries: Vec<(String, PatientRecord)>,
    index: HashMap<String, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    pub fn insert(&mut self, id: String, record: PatientRecord) -> Result<(), PatientError> {
        if self.contains(&id) {
            return Err(PatientError::DuplicateId(id));
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, record));
        Ok(())
    }

    /// Replaces the record stored under `id`, keeping its position.
    pub fn replace(&mut self, id: &str, record: PatientRecord) -> Result<PatientRecord, PatientError> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| PatientError::RecordNotFound(id.to_string()))?;
        Ok(std::mem::replace(&mut self.entries[slot].1, record))
    }

    pub fn remove(&mut self, id: &str) -> Result<PatientRecord, PatientError> {
        let slot = self
            .index
            .remove(id)
            .ok_or_else(|| PatientError::RecordNotFound(id.to_string()))?;
        let (_, record) = self.entries.remove(slot);
        for (key, _) in &self.entries[slot..] {
            if let Some(position) = self.index.get_mut(key) {
                *position -= 1;
            }
        }
        Ok(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatientRecord)> {
        self.entries.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn records(&self) -> impl Iterator<Item = &PatientRecord> {
        self.entries.iter().map(|(_, record)| record)
    }
}

impl Serialize for Collection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CollectionVisitor;

        impl<'de> Visitor<'de> for CollectionVisitor {
            type Value = Collection;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of patient IDs to patient records")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut collection = Collection::new();
                while let Some(id) = access.next_key::<String>()? {
                    let persisted: PersistedPatient = access.next_value()?;
                    let record = PatientRecord::try_from(persisted).map_err(|e| {
                        <A::Error as de::Error>::custom(format!("record {}: {}", id, e))
                    })?;
                    // A repeated key keeps its first position and its last value.
                    if collection.contains(&id) {
                        collection
                            .replace(&id, record)
                            .map_err(<A::Error as de::Error>::custom)?;
                    } else {
                        collection
                            .insert(id, record)
                            .map_err(<A::Error as de::Error>::custom)?;
                    }
                }
                Ok(collection)
            }
        }

        deserializer.deserialize_map(CollectionVisitor)
    }
}
