use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    consultation::{
        entities::{ConsultationView, Diagnosis, Exam, Patient},
        value_objects::{
            ConsultationStatus, DemographicsInput, LifestyleInput, NewPatient, PatientRecord,
            PatientSummary, RecordFields, SelectionInput, Step, Suggestions,
        },
    },
};

/// Repository trait for patients, consultations and their selections.
#[cfg_attr(test, mockall::automock)]
pub trait ConsultationRepository: Send + Sync {
    fn get_patient(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Option<Patient>, CoreError>> + Send;

    fn list_patients(&self) -> impl Future<Output = Result<Vec<Patient>, CoreError>> + Send;

    /// Create a patient and its first consultation as one atomic unit.
    fn create_patient_with_consultation(
        &self,
        input: NewPatient,
    ) -> impl Future<Output = Result<Patient, CoreError>> + Send;

    /// Delete a patient with its consultations and association rows.
    /// Returns false when no such patient exists.
    fn delete_patient(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// The patient's most recent consultation, with selections loaded.
    fn latest_consultation(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Option<ConsultationView>, CoreError>> + Send;

    fn update_demographics(
        &self,
        patient_id: Uuid,
        consultation_id: Uuid,
        input: DemographicsInput,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_lifestyle(
        &self,
        consultation_id: Uuid,
        input: LifestyleInput,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn set_symptoms(
        &self,
        consultation_id: Uuid,
        symptoms: String,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn set_mental_health(
        &self,
        consultation_id: Uuid,
        mental_health: String,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn set_wearable_data(
        &self,
        consultation_id: Uuid,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Wholesale-replace the stored previous-tests documents. This save
    /// path must fail loudly: losing uploaded clinical documents silently
    /// is unacceptable.
    fn save_previous_tests(
        &self,
        consultation_id: Uuid,
        reports: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn set_ai_diag_raw(
        &self,
        consultation_id: Uuid,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn set_ai_exam_raw(
        &self,
        consultation_id: Uuid,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Reconcile a full record into the relational rows: overwrite the
    /// consultation fields and wholesale-replace the association rows, all
    /// inside one transaction.
    fn update_consultation(
        &self,
        patient_id: Uuid,
        record: PatientRecord,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn get_or_create_diagnosis(
        &self,
        name: String,
    ) -> impl Future<Output = Result<Diagnosis, CoreError>> + Send;

    fn get_or_create_exam(
        &self,
        name: String,
    ) -> impl Future<Output = Result<Exam, CoreError>> + Send;
}

/// Client trait for the AI suggestion engine.
#[cfg_attr(test, mockall::automock)]
pub trait SuggestionClient: Send + Sync {
    fn differential(
        &self,
        fields: RecordFields,
        language: String,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Suggestions, CoreError>> + Send;

    fn exams(
        &self,
        selected_diagnoses: Vec<String>,
        language: String,
        session_id: Uuid,
    ) -> impl Future<Output = Result<Suggestions, CoreError>> + Send;
}

/// De-identification collaborator: returns the same record shape with
/// sensitive fields scrubbed.
#[cfg_attr(test, mockall::automock)]
pub trait Deidentifier: Send + Sync {
    fn redact(
        &self,
        record: PatientRecord,
    ) -> impl Future<Output = Result<PatientRecord, CoreError>> + Send;
}

/// Service trait for the consultation wizard operations.
#[cfg_attr(test, mockall::automock)]
pub trait ConsultationService: Send + Sync {
    fn create_patient(
        &self,
        lang: Option<String>,
    ) -> impl Future<Output = Result<Patient, CoreError>> + Send;

    fn list_patients(&self) -> impl Future<Output = Result<Vec<PatientSummary>, CoreError>> + Send;

    fn delete_patient(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn consultation_status(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<ConsultationStatus, CoreError>> + Send;

    /// Flatten the persisted state into a full record.
    fn patient_record(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<PatientRecord, CoreError>> + Send;

    fn submit_demographics(
        &self,
        patient_id: Uuid,
        input: DemographicsInput,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    fn submit_lifestyle(
        &self,
        patient_id: Uuid,
        input: LifestyleInput,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    fn submit_symptoms(
        &self,
        patient_id: Uuid,
        symptoms: String,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    fn submit_mental_health(
        &self,
        patient_id: Uuid,
        mental_health: String,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    /// Ask the engine for differential diagnoses and persist the raw
    /// payload.
    fn diagnosis_suggestions(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Suggestions, CoreError>> + Send;

    fn submit_diagnosis_selection(
        &self,
        patient_id: Uuid,
        input: SelectionInput,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;

    /// Ask the engine for exam suggestions based on the selected
    /// diagnoses and persist the raw payload.
    fn exam_suggestions(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = Result<Suggestions, CoreError>> + Send;

    /// Final step: store the exam selections, stamp the record and run it
    /// through the de-identifier before reconciling.
    fn submit_exam_selection(
        &self,
        patient_id: Uuid,
        input: SelectionInput,
    ) -> impl Future<Output = Result<Step, CoreError>> + Send;
}
