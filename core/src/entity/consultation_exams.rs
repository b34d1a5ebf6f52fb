use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consultation_exams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub consultation_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub exam_id: Uuid,
    pub accuracy: Option<i32>,
    pub relevance: Option<i32>,
    pub usefulness: Option<i32>,
    pub coherence: Option<i32>,
    pub safety: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consultations::Entity",
        from = "Column::ConsultationId",
        to = "super::consultations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Consultations,
    #[sea_orm(
        belongs_to = "super::exams::Entity",
        from = "Column::ExamId",
        to = "super::exams::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Exams,
}

impl Related<super::consultations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consultations.def()
    }
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
