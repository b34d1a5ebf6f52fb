use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consultations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub created_at: DateTime,
    pub timestamp: Option<DateTime>,
    pub lang: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub diet: Option<String>,
    pub sleep_hours: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub physical_activity: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mental_exercises: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub symptoms: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mental_health: Option<String>,
    pub previous_tests: Option<Json>,
    pub wearable_data: Option<Json>,
    pub ai_diag_raw: Option<Json>,
    pub ai_exam_raw: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patients::Entity",
        from = "Column::PatientId",
        to = "super::patients::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Patients,
    #[sea_orm(has_many = "super::consultation_diagnoses::Entity")]
    ConsultationDiagnoses,
    #[sea_orm(has_many = "super::consultation_exams::Entity")]
    ConsultationExams,
}

impl Related<super::patients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patients.def()
    }
}

impl Related<super::consultation_diagnoses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsultationDiagnoses.def()
    }
}

impl Related<super::consultation_exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsultationExams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
