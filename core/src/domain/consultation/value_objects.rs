use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::entities::app_errors::CoreError;
use crate::domain::consultation::entities::{ConsultationView, Patient};

/// One named stage of the consultation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Demographics,
    Lifestyle,
    Symptoms,
    Mental,
    Tests,
    Wearable,
    Diagnosis,
    Exams,
    Complete,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Demographics => "demographics",
            Step::Lifestyle => "lifestyle",
            Step::Symptoms => "symptoms",
            Step::Mental => "mental",
            Step::Tests => "tests",
            Step::Wearable => "wearable",
            Step::Diagnosis => "diagnosis",
            Step::Exams => "exams",
            Step::Complete => "complete",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record identity block: the patient's external UUID, the consultation
/// language and the clinical timestamp as an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub uuid: Uuid,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RecordMeta {
    /// Parse the ISO-8601 timestamp, accepting RFC 3339 as well as naive
    /// forms without a timezone (assumed UTC). Absent or empty strings map
    /// to `None`; a default timestamp is never invented.
    pub fn parsed_timestamp(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let Some(raw) = self.timestamp.as_deref() else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Some(dt.and_utc()));
            }
        }

        Err(CoreError::Validation(format!(
            "Invalid timestamp format: {raw}"
        )))
    }
}

/// Flat field block of a full patient record. Matches the consultation
/// columns by name, plus the patient-level demographics; absent fields are
/// left untouched on reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub age: Option<i32>,
    pub gender: Option<String>,
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
}

/// Physician ratings for one suggested diagnosis or exam. All fields are
/// optional; `safety` only applies to exams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSet {
    pub accuracy: Option<i32>,
    pub relevance: Option<i32>,
    pub usefulness: Option<i32>,
    pub coherence: Option<i32>,
    pub safety: Option<String>,
    pub comments: Option<String>,
}

/// One evaluation entry as submitted by the client: either the rating
/// fields directly, or the same fields wrapped under a `ratings` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationEntry {
    Wrapped { ratings: RatingSet },
    Flat(RatingSet),
}

impl EvaluationEntry {
    pub fn ratings(&self) -> &RatingSet {
        match self {
            EvaluationEntry::Wrapped { ratings } => ratings,
            EvaluationEntry::Flat(ratings) => ratings,
        }
    }
}

/// Per-suggestion evaluations, keyed by diagnosis or exam name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluations {
    pub ai_diag: BTreeMap<String, EvaluationEntry>,
    pub ai_exam: BTreeMap<String, EvaluationEntry>,
}

/// The full consolidated record for one patient: identity, flat field
/// block, ordered selections and their evaluations. This is the single
/// structure exchanged with the reconciler and the de-identifier; it is
/// validated once at the boundary instead of re-parsed at each consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub meta: RecordMeta,
    #[serde(rename = "patient")]
    pub fields: RecordFields,
    #[serde(default)]
    pub selected_diagnoses: Vec<String>,
    #[serde(default)]
    pub selected_exams: Vec<String>,
    #[serde(default)]
    pub ai_diag: Option<serde_json::Value>,
    #[serde(default)]
    pub ai_exam: Option<serde_json::Value>,
    #[serde(default)]
    pub evaluations: Evaluations,
}

impl PatientRecord {
    /// Flatten the persisted state into a full record. Evaluations are
    /// emitted in the wrapped form.
    pub fn from_parts(patient: &Patient, view: Option<&ConsultationView>) -> Self {
        let consultation = view.map(|v| &v.consultation);

        let meta = RecordMeta {
            uuid: patient.id,
            lang: consultation.and_then(|c| c.lang.clone()),
            timestamp: consultation.and_then(|c| c.timestamp.map(|t| t.to_rfc3339())),
        };

        let fields = RecordFields {
            age: patient.age,
            gender: patient.gender.clone(),
            weight_kg: consultation.and_then(|c| c.weight_kg),
            height_cm: consultation.and_then(|c| c.height_cm),
            diet: consultation.and_then(|c| c.diet.clone()),
            sleep_hours: consultation.and_then(|c| c.sleep_hours),
            physical_activity: consultation.and_then(|c| c.physical_activity.clone()),
            mental_exercises: consultation.and_then(|c| c.mental_exercises.clone()),
            symptoms: consultation.and_then(|c| c.symptoms.clone()),
            mental_health: consultation.and_then(|c| c.mental_health.clone()),
            previous_tests: consultation.and_then(|c| c.previous_tests.clone()),
            wearable_data: consultation.and_then(|c| c.wearable_data.clone()),
        };

        let mut evaluations = Evaluations::default();
        let mut selected_diagnoses = Vec::new();
        let mut selected_exams = Vec::new();

        if let Some(view) = view {
            for selection in &view.selected_diagnoses {
                selected_diagnoses.push(selection.name.clone());
                evaluations.ai_diag.insert(
                    selection.name.clone(),
                    EvaluationEntry::Wrapped {
                        ratings: RatingSet {
                            accuracy: selection.accuracy,
                            relevance: selection.relevance,
                            usefulness: selection.usefulness,
                            coherence: selection.coherence,
                            safety: None,
                            comments: selection.comments.clone(),
                        },
                    },
                );
            }
            for selection in &view.selected_exams {
                selected_exams.push(selection.name.clone());
                evaluations.ai_exam.insert(
                    selection.name.clone(),
                    EvaluationEntry::Wrapped {
                        ratings: RatingSet {
                            accuracy: selection.accuracy,
                            relevance: selection.relevance,
                            usefulness: selection.usefulness,
                            coherence: selection.coherence,
                            safety: selection.safety.clone(),
                            comments: selection.comments.clone(),
                        },
                    },
                );
            }
        }

        Self {
            meta,
            fields,
            selected_diagnoses,
            selected_exams,
            ai_diag: consultation.and_then(|c| c.ai_diag_raw.clone()),
            ai_exam: consultation.and_then(|c| c.ai_exam_raw.clone()),
            evaluations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsInput {
    pub age: i32,
    pub gender: String,
    pub weight_kg: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifestyleInput {
    pub diet: String,
    pub sleep_hours: f64,
    pub physical_activity: String,
    pub mental_exercises: String,
}

/// Physician selection for the diagnosis or exams step: the chosen names in
/// order, plus the evaluations keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub selected: Vec<String>,
    #[serde(default)]
    pub evaluations: BTreeMap<String, EvaluationEntry>,
}

/// Parameters for creating a patient together with its first consultation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub id: Uuid,
    pub lang: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Dashboard summary for one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub current_step: Step,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationStatus {
    pub patient_id: Uuid,
    pub current_step: Step,
    pub completed_steps: Vec<Step>,
    pub is_complete: bool,
    pub record: PatientRecord,
    pub lang: String,
}

/// Options returned by the suggestion engine: either a plain list of names
/// or a mapping keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionOptions {
    List(Vec<String>),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl SuggestionOptions {
    pub fn names(&self) -> Vec<String> {
        match self {
            SuggestionOptions::List(names) => names.clone(),
            SuggestionOptions::Map(map) => map.keys().cloned().collect(),
        }
    }
}

impl Default for SuggestionOptions {
    fn default() -> Self {
        SuggestionOptions::List(Vec::new())
    }
}

/// Response of the AI suggestion engine for either suggestion step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub summary: String,
    #[serde(default)]
    pub options: SuggestionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serializes_as_lowercase_name() {
        let json = serde_json::to_string(&Step::Demographics).unwrap();
        assert_eq!(json, "\"demographics\"");
        assert_eq!(Step::Mental.to_string(), "mental");

        let step: Step = serde_json::from_str("\"wearable\"").unwrap();
        assert_eq!(step, Step::Wearable);
    }

    #[test]
    fn evaluation_entry_accepts_wrapped_ratings() {
        let entry: EvaluationEntry = serde_json::from_str(
            r#"{"ratings": {"accuracy": 4, "relevance": 5, "comments": "plausible"}}"#,
        )
        .unwrap();

        let ratings = entry.ratings();
        assert_eq!(ratings.accuracy, Some(4));
        assert_eq!(ratings.relevance, Some(5));
        assert_eq!(ratings.comments.as_deref(), Some("plausible"));
        assert_eq!(ratings.safety, None);
    }

    #[test]
    fn evaluation_entry_accepts_flat_ratings() {
        let entry: EvaluationEntry =
            serde_json::from_str(r#"{"accuracy": 3, "safety": "safe"}"#).unwrap();

        let ratings = entry.ratings();
        assert_eq!(ratings.accuracy, Some(3));
        assert_eq!(ratings.safety.as_deref(), Some("safe"));
        assert_eq!(ratings.coherence, None);
    }

    #[test]
    fn record_meta_parses_iso_timestamps() {
        let meta = |raw: &str| RecordMeta {
            uuid: Uuid::nil(),
            lang: None,
            timestamp: Some(raw.to_string()),
        };

        let parsed = meta("2023-10-26T10:00:00").parsed_timestamp().unwrap();
        assert_eq!(
            parsed.unwrap().to_rfc3339(),
            "2023-10-26T10:00:00+00:00"
        );

        let parsed = meta("2023-10-26T10:00:00.123456Z").parsed_timestamp().unwrap();
        assert!(parsed.is_some());

        assert!(meta("not a timestamp").parsed_timestamp().is_err());
    }

    #[test]
    fn record_meta_never_invents_a_timestamp() {
        let meta = RecordMeta {
            uuid: Uuid::nil(),
            lang: None,
            timestamp: None,
        };
        assert_eq!(meta.parsed_timestamp().unwrap(), None);

        let meta = RecordMeta {
            uuid: Uuid::nil(),
            lang: None,
            timestamp: Some(String::new()),
        };
        assert_eq!(meta.parsed_timestamp().unwrap(), None);
    }

    #[test]
    fn suggestion_options_names_from_list_and_map() {
        let options: SuggestionOptions =
            serde_json::from_str(r#"["Hypertension", "Migraine"]"#).unwrap();
        assert_eq!(options.names(), vec!["Hypertension", "Migraine"]);

        let options: SuggestionOptions =
            serde_json::from_str(r#"{"Hypertension": "high blood pressure"}"#).unwrap();
        assert_eq!(options.names(), vec!["Hypertension"]);
    }
}
