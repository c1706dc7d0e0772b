use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub attempt_number: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub score: Option<Decimal>,
    #[sea_orm(column_type = "Json", nullable)]
    pub answers: Option<Json>,
    pub started_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub completed_at: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub time_taken_minutes: Option<i32>,
    #[sea_orm(nullable)]
    pub is_passed: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quiz::Entity",
        from = "Column::QuizId",
        to = "super::quiz::Column::Id"
    )]
    Quiz,
}

impl Related<super::quiz::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
