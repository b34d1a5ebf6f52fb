use std::collections::HashMap;

use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, generate_timestamp, generate_uuid_v7},
    consultation::{
        entities::{Consultation, ConsultationView, Diagnosis, Exam, Patient},
        ports::ConsultationRepository,
        value_objects::{DemographicsInput, LifestyleInput, NewPatient, PatientRecord},
    },
};
use crate::entity::{
    consultation_diagnoses::{
        ActiveModel as DiagnosisLinkActiveModel, Column as DiagnosisLinkColumn,
        Entity as DiagnosisLinkEntity,
    },
    consultation_exams::{
        ActiveModel as ExamLinkActiveModel, Column as ExamLinkColumn, Entity as ExamLinkEntity,
    },
    consultations::{
        ActiveModel as ConsultationActiveModel, Column as ConsultationColumn,
        Entity as ConsultationEntity, Model as ConsultationModel,
    },
    diagnoses::{
        ActiveModel as DiagnosisActiveModel, Column as DiagnosisColumn, Entity as DiagnosisEntity,
        Model as DiagnosisModel,
    },
    exams::{ActiveModel as ExamActiveModel, Column as ExamColumn, Entity as ExamEntity, Model as ExamModel},
    patients::{ActiveModel as PatientActiveModel, Entity as PatientEntity},
};
use crate::infrastructure::consultation::mappers::{map_selected_diagnosis, map_selected_exam};

#[derive(Debug, Clone)]
pub struct PostgresConsultationRepository {
    pub db: DatabaseConnection,
}

impl PostgresConsultationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The patient's most recent consultation row, if any.
    async fn latest_consultation_model<C: ConnectionTrait>(
        &self,
        conn: &C,
        patient_id: Uuid,
    ) -> Result<Option<ConsultationModel>, CoreError> {
        ConsultationEntity::find()
            .filter(ConsultationColumn::PatientId.eq(patient_id))
            .order_by_desc(ConsultationColumn::CreatedAt)
            .order_by_desc(ConsultationColumn::Id)
            .one(conn)
            .await
            .map_err(|e| {
                error!("Failed to get latest consultation: {}", e);
                CoreError::InternalServerError
            })
    }

    async fn load_view<C: ConnectionTrait>(
        &self,
        conn: &C,
        consultation: ConsultationModel,
    ) -> Result<ConsultationView, CoreError> {
        let diagnosis_links = DiagnosisLinkEntity::find()
            .filter(DiagnosisLinkColumn::ConsultationId.eq(consultation.id))
            .all(conn)
            .await
            .map_err(|e| {
                error!("Failed to load selected diagnoses: {}", e);
                CoreError::InternalServerError
            })?;

        let diagnosis_ids: Vec<Uuid> = diagnosis_links.iter().map(|l| l.diagnosis_id).collect();
        let diagnosis_names: HashMap<Uuid, String> = DiagnosisEntity::find()
            .filter(DiagnosisColumn::Id.is_in(diagnosis_ids))
            .all(conn)
            .await
            .map_err(|e| {
                error!("Failed to load diagnoses: {}", e);
                CoreError::InternalServerError
            })?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        let exam_links = ExamLinkEntity::find()
            .filter(ExamLinkColumn::ConsultationId.eq(consultation.id))
            .all(conn)
            .await
            .map_err(|e| {
                error!("Failed to load selected exams: {}", e);
                CoreError::InternalServerError
            })?;

        let exam_ids: Vec<Uuid> = exam_links.iter().map(|l| l.exam_id).collect();
        let exam_names: HashMap<Uuid, String> = ExamEntity::find()
            .filter(ExamColumn::Id.is_in(exam_ids))
            .all(conn)
            .await
            .map_err(|e| {
                error!("Failed to load exams: {}", e);
                CoreError::InternalServerError
            })?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();

        let selected_diagnoses = diagnosis_links
            .into_iter()
            .map(|link| {
                let name = diagnosis_names
                    .get(&link.diagnosis_id)
                    .cloned()
                    .unwrap_or_default();
                map_selected_diagnosis(link, name)
            })
            .collect();

        let selected_exams = exam_links
            .into_iter()
            .map(|link| {
                let name = exam_names.get(&link.exam_id).cloned().unwrap_or_default();
                map_selected_exam(link, name)
            })
            .collect();

        Ok(ConsultationView {
            consultation: consultation.into(),
            selected_diagnoses,
            selected_exams,
        })
    }

    /// Fetch a consultation row for a field update.
    async fn consultation_model(
        &self,
        consultation_id: Uuid,
    ) -> Result<ConsultationModel, CoreError> {
        ConsultationEntity::find_by_id(consultation_id)
            .one(&self.db)
            .await
            .map_err(|e| {
                error!("Failed to get consultation: {}", e);
                CoreError::InternalServerError
            })?
            .ok_or(CoreError::NotFound)
    }
}

async fn get_or_create_diagnosis_on<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<DiagnosisModel, CoreError> {
    let existing = DiagnosisEntity::find()
        .filter(DiagnosisColumn::Name.eq(name))
        .one(conn)
        .await
        .map_err(|e| {
            error!("Failed to look up diagnosis: {}", e);
            CoreError::InternalServerError
        })?;

    if let Some(diagnosis) = existing {
        return Ok(diagnosis);
    }

    DiagnosisEntity::insert(DiagnosisActiveModel {
        id: Set(generate_uuid_v7()),
        name: Set(name.to_string()),
    })
    .exec_with_returning(conn)
    .await
    .map_err(|e| {
        error!("Failed to create diagnosis: {}", e);
        CoreError::InternalServerError
    })
}

async fn get_or_create_exam_on<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<ExamModel, CoreError> {
    let existing = ExamEntity::find()
        .filter(ExamColumn::Name.eq(name))
        .one(conn)
        .await
        .map_err(|e| {
            error!("Failed to look up exam: {}", e);
            CoreError::InternalServerError
        })?;

    if let Some(exam) = existing {
        return Ok(exam);
    }

    ExamEntity::insert(ExamActiveModel {
        id: Set(generate_uuid_v7()),
        name: Set(name.to_string()),
    })
    .exec_with_returning(conn)
    .await
    .map_err(|e| {
        error!("Failed to create exam: {}", e);
        CoreError::InternalServerError
    })
}

impl ConsultationRepository for PostgresConsultationRepository {
    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, CoreError> {
        let patient = PatientEntity::find_by_id(patient_id)
            .one(&self.db)
            .await
            .map_err(|e| {
                error!("Failed to get patient: {}", e);
                CoreError::InternalServerError
            })?
            .map(Patient::from);

        Ok(patient)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, CoreError> {
        let patients = PatientEntity::find()
            .all(&self.db)
            .await
            .map_err(|e| {
                error!("Failed to list patients: {}", e);
                CoreError::InternalServerError
            })?
            .into_iter()
            .map(Patient::from)
            .collect();

        Ok(patients)
    }

    async fn create_patient_with_consultation(
        &self,
        input: NewPatient,
    ) -> Result<Patient, CoreError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            CoreError::InternalServerError
        })?;

        let (now, _) = generate_timestamp();

        let patient = PatientEntity::insert(PatientActiveModel {
            id: Set(input.id),
            age: Set(input.age),
            gender: Set(input.gender.clone()),
            created_at: Set(now.naive_utc()),
        })
        .exec_with_returning(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create patient: {}", e);
            CoreError::InternalServerError
        })?;

        let mut consultation = Consultation::new(patient.id);
        consultation.timestamp = input.timestamp;
        consultation.lang = input.lang;

        ConsultationEntity::insert(ConsultationActiveModel {
            id: Set(consultation.id),
            patient_id: Set(consultation.patient_id),
            created_at: Set(consultation.created_at.naive_utc()),
            timestamp: Set(consultation.timestamp.map(|t| t.naive_utc())),
            lang: Set(consultation.lang),
            ..Default::default()
        })
        .exec(&txn)
        .await
        .map_err(|e| {
            error!("Failed to create consultation: {}", e);
            CoreError::InternalServerError
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit patient creation: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(patient.into())
    }

    async fn delete_patient(&self, patient_id: Uuid) -> Result<bool, CoreError> {
        let Some(patient) = PatientEntity::find_by_id(patient_id)
            .one(&self.db)
            .await
            .map_err(|e| {
                error!("Failed to get patient: {}", e);
                CoreError::InternalServerError
            })?
        else {
            return Ok(false);
        };

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            CoreError::InternalServerError
        })?;

        let consultation_ids: Vec<Uuid> = ConsultationEntity::find()
            .filter(ConsultationColumn::PatientId.eq(patient.id))
            .all(&txn)
            .await
            .map_err(|e| {
                error!("Failed to list consultations: {}", e);
                CoreError::InternalServerError
            })?
            .into_iter()
            .map(|c| c.id)
            .collect();

        if !consultation_ids.is_empty() {
            DiagnosisLinkEntity::delete_many()
                .filter(DiagnosisLinkColumn::ConsultationId.is_in(consultation_ids.clone()))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!("Failed to delete diagnosis selections: {}", e);
                    CoreError::InternalServerError
                })?;

            ExamLinkEntity::delete_many()
                .filter(ExamLinkColumn::ConsultationId.is_in(consultation_ids))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!("Failed to delete exam selections: {}", e);
                    CoreError::InternalServerError
                })?;

            ConsultationEntity::delete_many()
                .filter(ConsultationColumn::PatientId.eq(patient.id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!("Failed to delete consultations: {}", e);
                    CoreError::InternalServerError
                })?;
        }

        PatientEntity::delete_by_id(patient.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to delete patient: {}", e);
                CoreError::InternalServerError
            })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit patient deletion: {}", e);
            CoreError::InternalServerError
        })?;

        info!(patient_id = %patient_id, "Deleted patient with consultations");

        Ok(true)
    }

    async fn latest_consultation(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<ConsultationView>, CoreError> {
        let Some(consultation) = self.latest_consultation_model(&self.db, patient_id).await? else {
            return Ok(None);
        };

        self.load_view(&self.db, consultation).await.map(Some)
    }

    async fn update_demographics(
        &self,
        patient_id: Uuid,
        consultation_id: Uuid,
        input: DemographicsInput,
    ) -> Result<(), CoreError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            CoreError::InternalServerError
        })?;

        let patient = PatientEntity::find_by_id(patient_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to get patient: {}", e);
                CoreError::InternalServerError
            })?
            .ok_or(CoreError::NotFound)?;

        let mut patient: PatientActiveModel = patient.into();
        patient.age = Set(Some(input.age));
        patient.gender = Set(Some(input.gender));
        patient.update(&txn).await.map_err(|e| {
            error!("Failed to update patient demographics: {}", e);
            CoreError::InternalServerError
        })?;

        let consultation = ConsultationEntity::find_by_id(consultation_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to get consultation: {}", e);
                CoreError::InternalServerError
            })?
            .ok_or(CoreError::NotFound)?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.weight_kg = Set(Some(input.weight_kg));
        consultation.height_cm = Set(Some(input.height_cm));
        consultation.update(&txn).await.map_err(|e| {
            error!("Failed to update consultation measurements: {}", e);
            CoreError::InternalServerError
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit demographics update: {}", e);
            CoreError::InternalServerError
        })
    }

    async fn update_lifestyle(
        &self,
        consultation_id: Uuid,
        input: LifestyleInput,
    ) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.diet = Set(Some(input.diet));
        consultation.sleep_hours = Set(Some(input.sleep_hours));
        consultation.physical_activity = Set(Some(input.physical_activity));
        consultation.mental_exercises = Set(Some(input.mental_exercises));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to update lifestyle: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    async fn set_symptoms(&self, consultation_id: Uuid, symptoms: String) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.symptoms = Set(Some(symptoms));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to update symptoms: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    async fn set_mental_health(
        &self,
        consultation_id: Uuid,
        mental_health: String,
    ) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.mental_health = Set(Some(mental_health));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to update mental health: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    async fn set_wearable_data(
        &self,
        consultation_id: Uuid,
        data: serde_json::Value,
    ) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.wearable_data = Set(Some(data));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to update wearable data: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    async fn save_previous_tests(
        &self,
        consultation_id: Uuid,
        reports: Vec<serde_json::Value>,
    ) -> Result<(), CoreError> {
        let consultation = self
            .consultation_model(consultation_id)
            .await
            .map_err(|_| CoreError::ReportSaveFailed)?;

        let count = reports.len();
        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.previous_tests = Set(Some(serde_json::Value::Array(reports)));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to save reports: {}", e);
            CoreError::ReportSaveFailed
        })?;

        info!("Saved {} reports", count);

        Ok(())
    }

    async fn set_ai_diag_raw(
        &self,
        consultation_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.ai_diag_raw = Set(Some(payload));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to store diagnosis payload: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    async fn set_ai_exam_raw(
        &self,
        consultation_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<(), CoreError> {
        let consultation = self.consultation_model(consultation_id).await?;

        let mut consultation: ConsultationActiveModel = consultation.into();
        consultation.ai_exam_raw = Set(Some(payload));
        consultation.update(&self.db).await.map_err(|e| {
            error!("Failed to store exam payload: {}", e);
            CoreError::InternalServerError
        })?;

        Ok(())
    }

    /// Merge a full record into the relational rows. Runs as one
    /// transaction: the association tables are wholesale-replaced, so a
    /// failure anywhere must leave the previous state untouched.
    async fn update_consultation(
        &self,
        patient_id: Uuid,
        record: PatientRecord,
    ) -> Result<(), CoreError> {
        let timestamp = record.meta.parsed_timestamp()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            CoreError::InternalServerError
        })?;

        let patient = PatientEntity::find_by_id(patient_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to get patient: {}", e);
                CoreError::InternalServerError
            })?
            .ok_or(CoreError::NotFound)?;

        let consultation = match self.latest_consultation_model(&txn, patient.id).await? {
            Some(consultation) => consultation,
            None => {
                let consultation = Consultation::new(patient.id);
                ConsultationEntity::insert(ConsultationActiveModel {
                    id: Set(consultation.id),
                    patient_id: Set(consultation.patient_id),
                    created_at: Set(consultation.created_at.naive_utc()),
                    ..Default::default()
                })
                .exec_with_returning(&txn)
                .await
                .map_err(|e| {
                    error!("Failed to create consultation: {}", e);
                    CoreError::InternalServerError
                })?
            }
        };
        let consultation_id = consultation.id;

        let fields = &record.fields;
        let mut active: ConsultationActiveModel = consultation.into();
        if let Some(weight_kg) = fields.weight_kg {
            active.weight_kg = Set(Some(weight_kg));
        }
        if let Some(height_cm) = fields.height_cm {
            active.height_cm = Set(Some(height_cm));
        }
        if let Some(diet) = fields.diet.clone() {
            active.diet = Set(Some(diet));
        }
        if let Some(sleep_hours) = fields.sleep_hours {
            active.sleep_hours = Set(Some(sleep_hours));
        }
        if let Some(physical_activity) = fields.physical_activity.clone() {
            active.physical_activity = Set(Some(physical_activity));
        }
        if let Some(mental_exercises) = fields.mental_exercises.clone() {
            active.mental_exercises = Set(Some(mental_exercises));
        }
        if let Some(symptoms) = fields.symptoms.clone() {
            active.symptoms = Set(Some(symptoms));
        }
        if let Some(mental_health) = fields.mental_health.clone() {
            active.mental_health = Set(Some(mental_health));
        }
        if let Some(previous_tests) = fields.previous_tests.clone() {
            active.previous_tests = Set(Some(previous_tests));
        }
        if let Some(wearable_data) = fields.wearable_data.clone() {
            active.wearable_data = Set(Some(wearable_data));
        }
        active.timestamp = Set(timestamp.map(|t| t.naive_utc()));
        active.ai_diag_raw = Set(record.ai_diag.clone());
        active.ai_exam_raw = Set(record.ai_exam.clone());
        active.update(&txn).await.map_err(|e| {
            error!("Failed to update consultation fields: {}", e);
            CoreError::InternalServerError
        })?;

        // Clear old evaluation rows so ratings never accumulate.
        DiagnosisLinkEntity::delete_many()
            .filter(DiagnosisLinkColumn::ConsultationId.eq(consultation_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to clear diagnosis selections: {}", e);
                CoreError::InternalServerError
            })?;

        ExamLinkEntity::delete_many()
            .filter(ExamLinkColumn::ConsultationId.eq(consultation_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to clear exam selections: {}", e);
                CoreError::InternalServerError
            })?;

        for name in &record.selected_diagnoses {
            let diagnosis = get_or_create_diagnosis_on(&txn, name).await?;
            let ratings = record
                .evaluations
                .ai_diag
                .get(name)
                .map(|entry| entry.ratings().clone())
                .unwrap_or_default();

            DiagnosisLinkEntity::insert(DiagnosisLinkActiveModel {
                consultation_id: Set(consultation_id),
                diagnosis_id: Set(diagnosis.id),
                accuracy: Set(ratings.accuracy),
                relevance: Set(ratings.relevance),
                usefulness: Set(ratings.usefulness),
                coherence: Set(ratings.coherence),
                comments: Set(ratings.comments),
            })
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to create diagnosis selection: {}", e);
                CoreError::InternalServerError
            })?;
        }

        for name in &record.selected_exams {
            let exam = get_or_create_exam_on(&txn, name).await?;
            let ratings = record
                .evaluations
                .ai_exam
                .get(name)
                .map(|entry| entry.ratings().clone())
                .unwrap_or_default();

            ExamLinkEntity::insert(ExamLinkActiveModel {
                consultation_id: Set(consultation_id),
                exam_id: Set(exam.id),
                accuracy: Set(ratings.accuracy),
                relevance: Set(ratings.relevance),
                usefulness: Set(ratings.usefulness),
                coherence: Set(ratings.coherence),
                safety: Set(ratings.safety),
                comments: Set(ratings.comments),
            })
            .exec(&txn)
            .await
            .map_err(|e| {
                error!("Failed to create exam selection: {}", e);
                CoreError::InternalServerError
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit consultation update: {}", e);
            CoreError::InternalServerError
        })?;

        info!(
            patient_id = %patient_id,
            diagnoses = record.selected_diagnoses.len(),
            exams = record.selected_exams.len(),
            "Reconciled consultation record"
        );

        Ok(())
    }

    async fn get_or_create_diagnosis(&self, name: String) -> Result<Diagnosis, CoreError> {
        get_or_create_diagnosis_on(&self.db, &name)
            .await
            .map(Diagnosis::from)
    }

    async fn get_or_create_exam(&self, name: String) -> Result<Exam, CoreError> {
        get_or_create_exam_on(&self.db, &name).await.map(Exam::from)
    }
}
