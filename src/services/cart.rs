use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{cart_item, course, CartItem, Category, Course, PricingTier},
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing::PricingService,
};

/// Per-user shopping cart over `cart_items` rows. A user holds at most one
/// tier of a given course; adding again replaces the stored tier and price.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    pricing: Arc<PricingService>,
}

impl CartService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, pricing: Arc<PricingService>) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    /// Returns the cart with course summaries joined in. Pure read.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartSnapshot, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::AddedAt)
            .all(&*self.db)
            .await?;

        let course_ids: Vec<Uuid> = rows.iter().map(|r| r.course_id).collect();
        let courses = self.course_summaries(&course_ids).await?;

        let items: Vec<CartItemView> = rows
            .into_iter()
            .filter_map(|row| {
                courses.get(&row.course_id).map(|course| CartItemView {
                    id: row.course_id,
                    course: course.clone(),
                    pricing_tier: row.pricing_tier,
                    price: row.unit_price,
                    added_at: row.added_at,
                })
            })
            .collect();

        let total: Decimal = items.iter().map(|i| i.price).sum();
        let item_count = items.len();

        Ok(CartSnapshot {
            items,
            total,
            item_count,
        })
    }

    /// Adds a course to the cart, capturing the current tier price. Upserts
    /// on (user, course): re-adding replaces tier, price and timestamp.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<AddToCartResult, ServiceError> {
        let course = Course::find_by_id(input.course_id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::CourseNotFound)?;

        let price_row = self.pricing.resolve(course.id, input.pricing_tier).await?;

        let txn = self.db.begin().await?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::CourseId.eq(input.course_id))
            .one(&txn)
            .await?;

        match existing {
            Some(row) => {
                let mut row: cart_item::ActiveModel = row.into();
                row.pricing_tier = Set(input.pricing_tier);
                row.unit_price = Set(price_row.price);
                row.added_at = Set(Utc::now());
                row.update(&txn).await?;
            }
            None => {
                let row = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    course_id: Set(input.course_id),
                    pricing_tier: Set(input.pricing_tier),
                    unit_price: Set(price_row.price),
                    added_at: Set(Utc::now()),
                };
                row.insert(&txn).await?;
            }
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                course_id: input.course_id,
            })
            .await;

        let cart = self.get_cart(user_id).await?;
        let cart_item = cart
            .items
            .iter()
            .find(|i| i.id == input.course_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("Cart item missing after upsert".to_string())
            })?;

        info!(%user_id, course_id = %input.course_id, tier = ?input.pricing_tier, "added course to cart");
        Ok(AddToCartResult {
            cart_item,
            cart_total: cart.total,
        })
    }

    /// Removes a course from the cart. Deleting an absent row is a no-op,
    /// so repeated removals are safe.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::CourseId.eq(course_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            self.event_sender
                .send_or_log(Event::CartItemRemoved { user_id, course_id })
                .await;
        }

        Ok(self.get_cart(user_id).await?.total)
    }

    async fn course_summaries(
        &self,
        course_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, CartCourseSummary>, ServiceError> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let courses = Course::find()
            .filter(course::Column::Id.is_in(course_ids.to_vec()))
            .find_also_related(Category)
            .all(&*self.db)
            .await?;

        Ok(courses
            .into_iter()
            .map(|(c, cat)| {
                (
                    c.id,
                    CartCourseSummary {
                        id: c.id,
                        title: c.title,
                        image: c.image_url,
                        category: cat.map(|c| c.name),
                    },
                )
            })
            .collect())
    }
}

/// Course fields shown on a cart line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartCourseSummary {
    pub id: Uuid,
    pub title: String,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    /// Course id doubles as the cart line id: one line per course.
    pub id: Uuid,
    pub course: CartCourseSummary,
    pub pricing_tier: PricingTier,
    pub price: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
    pub item_count: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartInput {
    pub course_id: Uuid,
    pub pricing_tier: PricingTier,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartResult {
    pub cart_item: CartItemView,
    pub cart_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn view(course_id: Uuid, price: Decimal) -> CartItemView {
        CartItemView {
            id: course_id,
            course: CartCourseSummary {
                id: course_id,
                title: "Course".to_string(),
                image: None,
                category: Some("Programming".to_string()),
            },
            pricing_tier: PricingTier::Basic,
            price,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_total_is_sum_of_prices() {
        let items = vec![
            view(Uuid::new_v4(), dec!(10.00)),
            view(Uuid::new_v4(), dec!(24.50)),
            view(Uuid::new_v4(), dec!(0.50)),
        ];
        let total: Decimal = items.iter().map(|i| i.price).sum();
        assert_eq!(total, dec!(35.00));
    }

    #[test]
    fn empty_cart_total_is_zero() {
        let items: Vec<CartItemView> = vec![];
        let total: Decimal = items.iter().map(|i| i.price).sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn add_to_cart_input_deserializes() {
        let json = r#"{
            "courseId": "550e8400-e29b-41d4-a716-446655440000",
            "pricingTier": "pro"
        }"#;
        let input: AddToCartInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.pricing_tier, PricingTier::Pro);
    }

    #[test]
    fn unknown_tier_rejected() {
        let json = r#"{
            "courseId": "550e8400-e29b-41d4-a716-446655440000",
            "pricingTier": "platinum"
        }"#;
        assert!(serde_json::from_str::<AddToCartInput>(json).is_err());
    }
}
