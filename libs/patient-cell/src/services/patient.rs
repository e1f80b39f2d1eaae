use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::PatientError;
use crate::models::{Collection, CreatePatientRequest, Patient, PatientRecord, UpdatePatientRequest};
use crate::services::store::{JsonFileStore, PatientStore};
use crate::services::{merge, sort, validation};

/// Runs each patient operation as one load, compute, save unit of work.
///
/// Mutations hold `write_lock` from load to save so two requests in this
/// process never interleave their read-modify-write cycles.
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    write_lock: Mutex<()>,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the JSON file store named by the config, creating an empty
    /// collection there if the file does not exist yet.
    pub async fn from_config(config: &AppConfig) -> Result<Self, PatientError> {
        let store = JsonFileStore::new(&config.patient_store_path);
        store.initialize().await?;
        info!("Using patient store at {}", store.path().display());
        Ok(Self::new(Arc::new(store)))
    }

    pub async fn list_patients(&self) -> Result<Collection, PatientError> {
        debug!("Listing all patients");
        self.store.load().await
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientRecord, PatientError> {
        debug!("Fetching patient: {}", patient_id);

        let collection = self.store.load().await?;
        collection
            .get(patient_id)
            .cloned()
            .ok_or_else(|| PatientError::RecordNotFound(patient_id.to_string()))
    }

    pub async fn sort_patients(
        &self,
        sort_by: &str,
        order: Option<&str>,
    ) -> Result<Vec<PatientRecord>, PatientError> {
        let (field, order) = sort::parse_sort_params(sort_by, order)?;
        debug!("Sorting patients by {:?} ({:?})", field, order);

        let collection = self.store.load().await?;
        Ok(sort::sort_records(&collection, field, order))
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let patient = validation::validate_new_patient(request)?;
        debug!("Creating patient: {}", patient.id);

        let _guard = self.write_lock.lock().await;
        let mut collection = self.store.load().await?;
        collection.insert(patient.id.clone(), patient.record.clone())?;
        self.store.save(&collection).await?;

        info!("Patient {} created (bmi {}, {})", patient.id, patient.record.bmi(), patient.record.verdict());
        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<PatientRecord, PatientError> {
        let update = validation::validate_update(request)?;
        debug!("Updating patient {} fields {:?}", patient_id, update.provided_fields());

        let _guard = self.write_lock.lock().await;
        let mut collection = self.store.load().await?;
        let existing = collection
            .get(patient_id)
            .ok_or_else(|| PatientError::RecordNotFound(patient_id.to_string()))?;

        let recompute = update.touches_measurements();
        let merged = merge::merge_update(existing, update)?;
        collection.replace(patient_id, merged.clone())?;
        self.store.save(&collection).await?;

        if recompute {
            info!("Patient {} updated, bmi now {} ({})", patient_id, merged.bmi(), merged.verdict());
        } else {
            info!("Patient {} updated", patient_id);
        }
        Ok(merged)
    }

    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        debug!("Deleting patient: {}", patient_id);

        let _guard = self.write_lock.lock().await;
        let mut collection = self.store.load().await?;
        collection.remove(patient_id)?;
        self.store.save(&collection).await?;

        info!("Patient {} deleted", patient_id);
        Ok(())
    }
}
