use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chapter quiz. `questions` holds the serialized question set, including
/// the correct answer ids; it is never returned to clients verbatim.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quizzes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Json")]
    pub questions: Json,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub passing_score: Decimal,
    #[sea_orm(nullable)]
    pub time_limit_minutes: Option<i32>,
    pub attempts_allowed: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chapter::Entity",
        from = "Column::ChapterId",
        to = "super::chapter::Column::Id"
    )]
    Chapter,
    #[sea_orm(has_many = "super::quiz_attempt::Entity")]
    Attempts,
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl Related<super::quiz_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
