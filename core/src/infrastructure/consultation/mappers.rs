use chrono::{TimeZone, Utc};

use crate::domain::consultation::entities::{
    Consultation, Diagnosis, Exam, Patient, SelectedDiagnosis, SelectedExam,
};
use crate::entity::{consultation_diagnoses, consultation_exams, consultations, diagnoses, exams, patients};

impl From<patients::Model> for Patient {
    fn from(model: patients::Model) -> Self {
        Patient {
            id: model.id,
            age: model.age,
            gender: model.gender,
            created_at: Utc.from_utc_datetime(&model.created_at),
        }
    }
}

impl From<consultations::Model> for Consultation {
    fn from(model: consultations::Model) -> Self {
        Consultation {
            id: model.id,
            patient_id: model.patient_id,
            created_at: Utc.from_utc_datetime(&model.created_at),
            timestamp: model.timestamp.map(|dt| dt.and_utc()),
            lang: model.lang,
            weight_kg: model.weight_kg,
            height_cm: model.height_cm,
            diet: model.diet,
            sleep_hours: model.sleep_hours,
            physical_activity: model.physical_activity,
            mental_exercises: model.mental_exercises,
            symptoms: model.symptoms,
            mental_health: model.mental_health,
            previous_tests: model.previous_tests,
            wearable_data: model.wearable_data,
            ai_diag_raw: model.ai_diag_raw,
            ai_exam_raw: model.ai_exam_raw,
        }
    }
}

impl From<diagnoses::Model> for Diagnosis {
    fn from(model: diagnoses::Model) -> Self {
        Diagnosis {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<exams::Model> for Exam {
    fn from(model: exams::Model) -> Self {
        Exam {
            id: model.id,
            name: model.name,
        }
    }
}

/// Combine an association row with the joined diagnosis name.
pub fn map_selected_diagnosis(
    model: consultation_diagnoses::Model,
    name: String,
) -> SelectedDiagnosis {
    SelectedDiagnosis {
        consultation_id: model.consultation_id,
        diagnosis_id: model.diagnosis_id,
        name,
        accuracy: model.accuracy,
        relevance: model.relevance,
        usefulness: model.usefulness,
        coherence: model.coherence,
        comments: model.comments,
    }
}

/// Combine an association row with the joined exam name.
pub fn map_selected_exam(model: consultation_exams::Model, name: String) -> SelectedExam {
    SelectedExam {
        consultation_id: model.consultation_id,
        exam_id: model.exam_id,
        name,
        accuracy: model.accuracy,
        relevance: model.relevance,
        usefulness: model.usefulness,
        coherence: model.coherence,
        safety: model.safety,
        comments: model.comments,
    }
}
