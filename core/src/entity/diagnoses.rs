use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "diagnoses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consultation_diagnoses::Entity")]
    ConsultationDiagnoses,
}

impl Related<super::consultation_diagnoses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsultationDiagnoses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
