use crate::domain::consultation::entities::{ConsultationView, Patient};
use crate::domain::consultation::value_objects::Step;

/// Determine the next wizard step from the persisted data alone.
///
/// There is no stored status: progress is re-derived on every call, so any
/// step can be resubmitted and the wizard resumes correctly after partial
/// writes or restarts. The checks run in fixed wizard order and stop at the
/// first missing field. Presence is what counts — a skipped uploads step
/// stores an empty array, which still advances the machine.
pub fn next_step(patient: &Patient, view: Option<&ConsultationView>) -> Step {
    let Some(view) = view else {
        return Step::Demographics;
    };
    let consultation = &view.consultation;

    if patient.age.is_none() {
        return Step::Demographics;
    }
    if consultation.diet.is_none() {
        return Step::Lifestyle;
    }
    if consultation.symptoms.is_none() {
        return Step::Symptoms;
    }
    if consultation.mental_health.is_none() {
        return Step::Mental;
    }
    if consultation.previous_tests.is_none() {
        return Step::Tests;
    }
    if consultation.wearable_data.is_none() {
        return Step::Wearable;
    }
    if view.selected_diagnoses.is_empty() {
        return Step::Diagnosis;
    }
    if view.selected_exams.is_empty() {
        return Step::Exams;
    }
    Step::Complete
}

/// The steps already satisfied by the persisted data, in wizard order.
/// Uses the same presence rules as [`next_step`].
pub fn completed_steps(patient: &Patient, view: Option<&ConsultationView>) -> Vec<Step> {
    let mut completed = Vec::new();

    if patient.age.is_some() {
        completed.push(Step::Demographics);
    }
    let Some(view) = view else {
        return completed;
    };
    let consultation = &view.consultation;

    if consultation.diet.is_some() {
        completed.push(Step::Lifestyle);
    }
    if consultation.symptoms.is_some() {
        completed.push(Step::Symptoms);
    }
    if consultation.mental_health.is_some() {
        completed.push(Step::Mental);
    }
    if consultation.previous_tests.is_some() {
        completed.push(Step::Tests);
    }
    if consultation.wearable_data.is_some() {
        completed.push(Step::Wearable);
    }
    if !view.selected_diagnoses.is_empty() {
        completed.push(Step::Diagnosis);
    }
    if !view.selected_exams.is_empty() {
        completed.push(Step::Exams);
    }

    completed
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::consultation::entities::{
        Consultation, SelectedDiagnosis, SelectedExam,
    };

    fn patient(age: Option<i32>) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            age,
            gender: age.map(|_| "female".to_string()),
            created_at: Utc::now(),
        }
    }

    fn view(consultation: Consultation) -> ConsultationView {
        ConsultationView {
            consultation,
            selected_diagnoses: Vec::new(),
            selected_exams: Vec::new(),
        }
    }

    fn selected_diagnosis(consultation_id: Uuid, name: &str) -> SelectedDiagnosis {
        SelectedDiagnosis {
            consultation_id,
            diagnosis_id: Uuid::new_v4(),
            name: name.to_string(),
            accuracy: Some(4),
            relevance: None,
            usefulness: None,
            coherence: None,
            comments: None,
        }
    }

    fn selected_exam(consultation_id: Uuid, name: &str) -> SelectedExam {
        SelectedExam {
            consultation_id,
            exam_id: Uuid::new_v4(),
            name: name.to_string(),
            accuracy: None,
            relevance: None,
            usefulness: None,
            coherence: None,
            safety: Some("safe".to_string()),
            comments: None,
        }
    }

    /// A view with every tracked field populated and both selections made.
    fn complete_view() -> (Patient, ConsultationView) {
        let patient = patient(Some(44));
        let mut consultation = Consultation::new(patient.id);
        consultation.diet = Some("balanced".to_string());
        consultation.symptoms = Some("headache".to_string());
        consultation.mental_health = Some("stable".to_string());
        consultation.previous_tests = Some(json!([]));
        consultation.wearable_data = Some(json!([]));

        let consultation_id = consultation.id;
        let mut view = view(consultation);
        view.selected_diagnoses
            .push(selected_diagnosis(consultation_id, "Migraine"));
        view.selected_exams
            .push(selected_exam(consultation_id, "MRI"));

        (patient, view)
    }

    #[test]
    fn patient_without_consultation_starts_at_demographics() {
        assert_eq!(next_step(&patient(None), None), Step::Demographics);
    }

    #[test]
    fn missing_age_keeps_demographics_even_with_consultation() {
        let p = patient(None);
        let v = view(Consultation::new(p.id));
        assert_eq!(next_step(&p, Some(&v)), Step::Demographics);
    }

    #[test]
    fn steps_advance_in_fixed_order() {
        let p = patient(Some(30));
        let mut consultation = Consultation::new(p.id);

        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Lifestyle);

        consultation.diet = Some("vegetarian".to_string());
        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Symptoms);

        consultation.symptoms = Some("fatigue".to_string());
        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Mental);

        consultation.mental_health = Some("anxious".to_string());
        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Tests);

        consultation.previous_tests = Some(json!([{"filename": "blood.pdf"}]));
        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Wearable);

        consultation.wearable_data = Some(json!({"steps": 9000}));
        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Diagnosis);
    }

    #[test]
    fn empty_array_sentinel_counts_as_present() {
        // Skipping uploads stores an empty list; absent and empty must not
        // be conflated or the wizard would never advance past the step.
        let p = patient(Some(51));
        let mut consultation = Consultation::new(p.id);
        consultation.diet = Some("omnivore".to_string());
        consultation.symptoms = Some("cough".to_string());
        consultation.mental_health = Some("fine".to_string());
        consultation.previous_tests = Some(json!([]));

        assert_eq!(next_step(&p, Some(&view(consultation.clone()))), Step::Wearable);

        consultation.wearable_data = Some(json!([]));
        assert_eq!(next_step(&p, Some(&view(consultation))), Step::Diagnosis);
    }

    #[test]
    fn selections_gate_the_last_two_steps() {
        let (p, mut v) = complete_view();
        assert_eq!(next_step(&p, Some(&v)), Step::Complete);

        v.selected_exams.clear();
        assert_eq!(next_step(&p, Some(&v)), Step::Exams);

        v.selected_diagnoses.clear();
        assert_eq!(next_step(&p, Some(&v)), Step::Diagnosis);
    }

    #[test]
    fn fully_populated_record_is_complete() {
        let (p, v) = complete_view();
        assert_eq!(next_step(&p, Some(&v)), Step::Complete);
        assert_eq!(
            completed_steps(&p, Some(&v)),
            vec![
                Step::Demographics,
                Step::Lifestyle,
                Step::Symptoms,
                Step::Mental,
                Step::Tests,
                Step::Wearable,
                Step::Diagnosis,
                Step::Exams,
            ]
        );
    }

    #[test]
    fn completed_steps_for_partial_record() {
        let p = patient(Some(30));
        let mut consultation = Consultation::new(p.id);
        consultation.diet = Some("keto".to_string());

        assert_eq!(
            completed_steps(&p, Some(&view(consultation))),
            vec![Step::Demographics, Step::Lifestyle]
        );
        assert_eq!(completed_steps(&patient(None), None), Vec::<Step>::new());
    }
}
