use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::generate_timestamp;

/// Core patient demographics. Identified by the externally visible UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One clinical encounter. Every wizard step writes into this record; the
/// step state machine derives progress purely from which fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub timestamp: Option<DateTime<Utc>>,
    pub lang: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub diet: Option<String>,
    pub sleep_hours: Option<f64>,
    pub physical_activity: Option<String>,
    pub mental_exercises: Option<String>,
    pub symptoms: Option<String>,
    pub mental_health: Option<String>,
    pub previous_tests: Option<serde_json::Value>,
    pub wearable_data: Option<serde_json::Value>,
    pub ai_diag_raw: Option<serde_json::Value>,
    pub ai_exam_raw: Option<serde_json::Value>,
}

impl Consultation {
    pub fn new(patient_id: Uuid) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            patient_id,
            created_at: now,
            timestamp: None,
            lang: None,
            weight_kg: None,
            height_cm: None,
            diet: None,
            sleep_hours: None,
            physical_activity: None,
            mental_exercises: None,
            symptoms: None,
            mental_health: None,
            previous_tests: None,
            wearable_data: None,
            ai_diag_raw: None,
            ai_exam_raw: None,
        }
    }
}

/// Deduplicated diagnosis reference row. The name is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    pub name: String,
}

/// Deduplicated exam reference row. The name is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: Uuid,
    pub name: String,
}

/// A diagnosis the physician selected for a consultation, with the ratings
/// entered for it. Mirrors one association row; the name is denormalized
/// from the diagnosis reference row for display and record flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDiagnosis {
    pub consultation_id: Uuid,
    pub diagnosis_id: Uuid,
    pub name: String,
    pub accuracy: Option<i32>,
    pub relevance: Option<i32>,
    pub usefulness: Option<i32>,
    pub coherence: Option<i32>,
    pub comments: Option<String>,
}

/// A selected exam with its ratings, including the additional safety rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedExam {
    pub consultation_id: Uuid,
    pub exam_id: Uuid,
    pub name: String,
    pub accuracy: Option<i32>,
    pub relevance: Option<i32>,
    pub usefulness: Option<i32>,
    pub coherence: Option<i32>,
    pub safety: Option<String>,
    pub comments: Option<String>,
}

/// A consultation together with its selections, loaded explicitly by the
/// repository instead of navigated through lazy ORM relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationView {
    pub consultation: Consultation,
    pub selected_diagnoses: Vec<SelectedDiagnosis>,
    pub selected_exams: Vec<SelectedExam>,
}
