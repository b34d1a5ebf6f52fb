pub mod consultation_diagnoses;
pub mod consultation_exams;
pub mod consultations;
pub mod diagnoses;
pub mod exams;
pub mod patients;
