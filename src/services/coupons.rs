use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{coupon, coupon_usage, Coupon, DiscountType},
    errors::ServiceError,
};

/// Validates coupon codes against a cart subtotal and records redemptions.
/// Validation is advisory: the counter only moves at payment confirmation,
/// inside the confirmation transaction, so an unpaid order never consumes a
/// use.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DbPool>,
}

/// Outcome of a successful validation, staged on the order until payment.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AppliedCoupon {
    pub coupon_id: Uuid,
    pub discount_amount: Decimal,
}

impl CouponService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Checks a code against the active flag, validity window and usage
    /// limit, returning the discount it would grant on `subtotal`.
    #[instrument(skip(self))]
    pub async fn validate(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<AppliedCoupon, ServiceError> {
        let now = Utc::now();

        let coupon = Coupon::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Invalid coupon".to_string()))?;

        if !coupon.is_active || now < coupon.valid_from || now > coupon.valid_until {
            return Err(ServiceError::ValidationError("Invalid coupon".to_string()));
        }

        if let Some(limit) = coupon.usage_limit {
            if coupon.used_count >= limit {
                return Err(ServiceError::ValidationError(
                    "Coupon usage limit reached".to_string(),
                ));
            }
        }

        Ok(AppliedCoupon {
            coupon_id: coupon.id,
            discount_amount: calculate_discount(
                coupon.discount_type,
                coupon.discount_value,
                subtotal,
            ),
        })
    }

    /// Records a redemption inside the caller's transaction: increments
    /// `used_count` (guarded against overshooting the limit) and appends the
    /// audit row. Returns false when the limit was exhausted between order
    /// creation and confirmation; the order still completes, the counter
    /// just does not overshoot.
    pub async fn redeem<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        discount_amount: Decimal,
    ) -> Result<bool, ServiceError> {
        let updated = Coupon::update_many()
            .col_expr(
                coupon::Column::UsedCount,
                Expr::col(coupon::Column::UsedCount).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupon::Column::UsedCount)
                            .lt(Expr::col(coupon::Column::UsageLimit)),
                    ),
            )
            .exec(conn)
            .await?;

        if updated.rows_affected == 0 {
            warn!(%coupon_id, %order_id, "coupon limit exhausted before confirmation; skipping redemption record");
            return Ok(false);
        }

        let usage = coupon_usage::ActiveModel {
            id: Set(Uuid::new_v4()),
            coupon_id: Set(coupon_id),
            user_id: Set(user_id),
            order_id: Set(order_id),
            discount_amount: Set(discount_amount),
            used_at: Set(Utc::now()),
        };
        usage.insert(conn).await?;

        Ok(true)
    }

    /// Admin: creates a coupon. The code must be unique.
    #[instrument(skip(self))]
    pub async fn create_coupon(
        &self,
        input: CreateCouponInput,
    ) -> Result<coupon::Model, ServiceError> {
        if input.discount_value <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Discount value must be positive".to_string(),
            ));
        }
        if input.discount_type == DiscountType::Percentage
            && input.discount_value > Decimal::from(100)
        {
            return Err(ServiceError::ValidationError(
                "Percentage discount cannot exceed 100".to_string(),
            ));
        }
        if input.valid_until <= input.valid_from {
            return Err(ServiceError::ValidationError(
                "Validity window is empty".to_string(),
            ));
        }

        let existing = Coupon::find()
            .filter(coupon::Column::Code.eq(input.code.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon code {} already exists",
                input.code
            )));
        }

        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(input.code),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            valid_from: Set(input.valid_from),
            valid_until: Set(input.valid_until),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        info!(code = %created.code, "created coupon");
        Ok(created)
    }

    /// Admin: lists coupons, newest first.
    pub async fn list_coupons(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<coupon::Model>, u64), ServiceError> {
        let paginator = Coupon::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}

/// Discount granted by a coupon on a subtotal. Percentage discounts take a
/// share of the subtotal; fixed discounts are clamped to it so the total
/// never goes negative. Result is rounded to cents.
pub fn calculate_discount(
    discount_type: DiscountType,
    discount_value: Decimal,
    subtotal: Decimal,
) -> Decimal {
    let discount = match discount_type {
        DiscountType::Percentage => subtotal * discount_value / Decimal::from(100),
        DiscountType::Fixed => discount_value.min(subtotal),
    };
    discount.max(Decimal::ZERO).round_dp(2)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponInput {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub usage_limit: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: Option<bool>,
}
