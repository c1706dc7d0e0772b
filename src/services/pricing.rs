use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{course_pricing, CoursePricing, PricingTier},
    errors::ServiceError,
};

/// Resolves (course, tier) to the live price row. Checkout captures the
/// resolved price into the cart; later catalog edits do not move carts.
#[derive(Clone)]
pub struct PricingService {
    db: Arc<DbPool>,
}

impl PricingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Looks up the price row for a course tier.
    pub async fn resolve(
        &self,
        course_id: Uuid,
        tier: PricingTier,
    ) -> Result<course_pricing::Model, ServiceError> {
        CoursePricing::find()
            .filter(course_pricing::Column::CourseId.eq(course_id))
            .filter(course_pricing::Column::Tier.eq(tier))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Pricing tier not found".to_string()))
    }

    /// All pricing rows for a set of courses, grouped by course id.
    pub async fn for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<course_pricing::Model>>, ServiceError> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = CoursePricing::find()
            .filter(course_pricing::Column::CourseId.is_in(course_ids.to_vec()))
            .all(&*self.db)
            .await?;

        let mut map: HashMap<Uuid, Vec<course_pricing::Model>> = HashMap::new();
        for row in rows {
            map.entry(row.course_id).or_default().push(row);
        }
        Ok(map)
    }
}
