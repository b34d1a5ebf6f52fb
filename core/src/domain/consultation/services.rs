use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    consultation::{
        entities::{ConsultationView, Patient},
        ports::{ConsultationRepository, ConsultationService, Deidentifier, SuggestionClient},
        steps::{completed_steps, next_step},
        value_objects::{
            ConsultationStatus, DemographicsInput, Evaluations, LifestyleInput, NewPatient,
            PatientRecord, PatientSummary, SelectionInput, Step, Suggestions,
        },
    },
    reports::ports::{ReportExtractor, WearableExtractor},
};

impl<CR, RE, WE, SC, DE> Service<CR, RE, WE, SC, DE>
where
    CR: ConsultationRepository,
    RE: ReportExtractor,
    WE: WearableExtractor,
    SC: SuggestionClient,
    DE: Deidentifier,
{
    pub(crate) async fn require_patient(&self, patient_id: Uuid) -> Result<Patient, CoreError> {
        self.consultation_repository
            .get_patient(patient_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    pub(crate) async fn wizard_state(
        &self,
        patient_id: Uuid,
    ) -> Result<(Patient, Option<ConsultationView>), CoreError> {
        let patient = self.require_patient(patient_id).await?;
        let view = self
            .consultation_repository
            .latest_consultation(patient_id)
            .await?;
        Ok((patient, view))
    }

    /// Patient plus its latest consultation; every step past the wizard
    /// start requires one to exist.
    pub(crate) async fn require_view(
        &self,
        patient_id: Uuid,
    ) -> Result<(Patient, ConsultationView), CoreError> {
        let (patient, view) = self.wizard_state(patient_id).await?;
        let view = view.ok_or(CoreError::NotFound)?;
        Ok((patient, view))
    }

    /// Re-derive the current step from the persisted data.
    pub(crate) async fn current_step(&self, patient_id: Uuid) -> Result<Step, CoreError> {
        let (patient, view) = self.wizard_state(patient_id).await?;
        Ok(next_step(&patient, view.as_ref()))
    }
}

impl<CR, RE, WE, SC, DE> ConsultationService for Service<CR, RE, WE, SC, DE>
where
    CR: ConsultationRepository,
    RE: ReportExtractor,
    WE: WearableExtractor,
    SC: SuggestionClient,
    DE: Deidentifier,
{
    async fn create_patient(&self, lang: Option<String>) -> Result<Patient, CoreError> {
        let input = NewPatient {
            id: Uuid::new_v4(),
            lang,
            age: None,
            gender: None,
            timestamp: None,
        };

        let patient = self
            .consultation_repository
            .create_patient_with_consultation(input)
            .await?;

        info!(patient_id = %patient.id, "Created patient and first consultation");

        Ok(patient)
    }

    async fn list_patients(&self) -> Result<Vec<PatientSummary>, CoreError> {
        let patients = self.consultation_repository.list_patients().await?;

        let mut summaries = Vec::with_capacity(patients.len());
        for patient in patients {
            let view = self
                .consultation_repository
                .latest_consultation(patient.id)
                .await?;
            let current_step = next_step(&patient, view.as_ref());

            summaries.push(PatientSummary {
                patient_id: patient.id,
                created_at: view.as_ref().and_then(|v| v.consultation.timestamp),
                current_step,
                is_complete: current_step == Step::Complete,
            });
        }

        Ok(summaries)
    }

    async fn delete_patient(&self, patient_id: Uuid) -> Result<(), CoreError> {
        let deleted = self
            .consultation_repository
            .delete_patient(patient_id)
            .await?;
        if !deleted {
            return Err(CoreError::NotFound);
        }

        info!(patient_id = %patient_id, "Deleted patient record");

        Ok(())
    }

    async fn consultation_status(&self, patient_id: Uuid) -> Result<ConsultationStatus, CoreError> {
        let (patient, view) = self.wizard_state(patient_id).await?;

        let record = PatientRecord::from_parts(&patient, view.as_ref());
        let current_step = next_step(&patient, view.as_ref());
        let lang = record
            .meta
            .lang
            .clone()
            .unwrap_or_else(|| "en".to_string());

        Ok(ConsultationStatus {
            patient_id,
            current_step,
            completed_steps: completed_steps(&patient, view.as_ref()),
            is_complete: current_step == Step::Complete,
            record,
            lang,
        })
    }

    async fn patient_record(&self, patient_id: Uuid) -> Result<PatientRecord, CoreError> {
        let (patient, view) = self.wizard_state(patient_id).await?;
        Ok(PatientRecord::from_parts(&patient, view.as_ref()))
    }

    async fn submit_demographics(
        &self,
        patient_id: Uuid,
        input: DemographicsInput,
    ) -> Result<Step, CoreError> {
        let (patient, view) = self.require_view(patient_id).await?;

        self.consultation_repository
            .update_demographics(patient.id, view.consultation.id, input)
            .await?;

        self.current_step(patient_id).await
    }

    async fn submit_lifestyle(
        &self,
        patient_id: Uuid,
        input: LifestyleInput,
    ) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        self.consultation_repository
            .update_lifestyle(view.consultation.id, input)
            .await?;

        self.current_step(patient_id).await
    }

    async fn submit_symptoms(&self, patient_id: Uuid, symptoms: String) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        self.consultation_repository
            .set_symptoms(view.consultation.id, symptoms)
            .await?;

        self.current_step(patient_id).await
    }

    async fn submit_mental_health(
        &self,
        patient_id: Uuid,
        mental_health: String,
    ) -> Result<Step, CoreError> {
        let (_, view) = self.require_view(patient_id).await?;

        self.consultation_repository
            .set_mental_health(view.consultation.id, mental_health)
            .await?;

        self.current_step(patient_id).await
    }

    async fn diagnosis_suggestions(&self, patient_id: Uuid) -> Result<Suggestions, CoreError> {
        let (patient, view) = self.require_view(patient_id).await?;
        let record = PatientRecord::from_parts(&patient, Some(&view));
        let language = record
            .meta
            .lang
            .clone()
            .unwrap_or_else(|| "en".to_string());

        let suggestions = self
            .suggestion_client
            .differential(record.fields.clone(), language, patient.id)
            .await?;

        let payload =
            serde_json::to_value(&suggestions).map_err(|_| CoreError::InternalServerError)?;
        self.consultation_repository
            .set_ai_diag_raw(view.consultation.id, payload)
            .await?;

        Ok(suggestions)
    }

    async fn submit_diagnosis_selection(
        &self,
        patient_id: Uuid,
        input: SelectionInput,
    ) -> Result<Step, CoreError> {
        let (patient, view) = self.require_view(patient_id).await?;

        let mut record = PatientRecord::from_parts(&patient, Some(&view));
        record.selected_diagnoses = input.selected;
        record.evaluations = Evaluations {
            ai_diag: input.evaluations,
            ai_exam: BTreeMap::new(),
        };

        self.consultation_repository
            .update_consultation(patient.id, record)
            .await?;

        self.current_step(patient_id).await
    }

    async fn exam_suggestions(&self, patient_id: Uuid) -> Result<Suggestions, CoreError> {
        let (patient, view) = self.require_view(patient_id).await?;
        let record = PatientRecord::from_parts(&patient, Some(&view));
        let language = record
            .meta
            .lang
            .clone()
            .unwrap_or_else(|| "en".to_string());

        let suggestions = self
            .suggestion_client
            .exams(record.selected_diagnoses.clone(), language, patient.id)
            .await?;

        let payload =
            serde_json::to_value(&suggestions).map_err(|_| CoreError::InternalServerError)?;
        self.consultation_repository
            .set_ai_exam_raw(view.consultation.id, payload)
            .await?;

        Ok(suggestions)
    }

    async fn submit_exam_selection(
        &self,
        patient_id: Uuid,
        input: SelectionInput,
    ) -> Result<Step, CoreError> {
        let (patient, view) = self.require_view(patient_id).await?;

        let mut record = PatientRecord::from_parts(&patient, Some(&view));
        record.selected_exams = input.selected;
        record.evaluations.ai_exam = input.evaluations;
        record.meta.timestamp = Some(Utc::now().to_rfc3339());

        let record = self.deidentifier.redact(record).await?;

        self.consultation_repository
            .update_consultation(patient.id, record)
            .await?;

        info!(patient_id = %patient_id, "Finalized consultation record");

        self.current_step(patient_id).await
    }
}
