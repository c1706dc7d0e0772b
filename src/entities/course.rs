use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course catalog entry. Prices live in `course_pricing`, one row per tier,
/// so historical order snapshots are independent of catalog edits.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: Uuid,
    pub instructor_id: Uuid,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    pub level: String,
    #[sea_orm(nullable)]
    pub duration_minutes: Option<i32>,
    pub language: String,
    #[sea_orm(column_type = "Decimal(Some((3, 2)))")]
    pub rating: Decimal,
    pub student_count: i32,
    #[sea_orm(column_type = "Json", nullable)]
    pub tags: Option<Json>,
    pub is_certified: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::instructor::Entity",
        from = "Column::InstructorId",
        to = "super::instructor::Column::Id"
    )]
    Instructor,
    #[sea_orm(has_many = "super::chapter::Entity")]
    Chapters,
    #[sea_orm(has_many = "super::course_pricing::Entity")]
    Pricing,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::instructor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapters.def()
    }
}

impl Related<super::course_pricing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pricing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
