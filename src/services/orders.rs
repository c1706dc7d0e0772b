use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        cart_item, order, order_item, user_course_progress, CartItem, EnrollmentStatus, Order,
        OrderItem, PaymentStatus, UserCourseProgress,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{cart::CartService, coupons::CouponService, payments::PaymentGateway},
};

const PAYMENT_PROVIDER: &str = "stripe";

/// Checkout workflow: snapshots the cart into an order with a payment
/// intent, then finalizes on confirmed payment. Orders are created
/// `pending` and flip to `completed` exactly once; everything the flip
/// implies (coupon redemption, cart clear, enrollment) happens in a single
/// transaction on the order row.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    gateway: Arc<dyn PaymentGateway>,
    coupons: Arc<CouponService>,
    cart: Arc<CartService>,
}

impl OrderService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        coupons: Arc<CouponService>,
        cart: Arc<CartService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            coupons,
            cart,
        }
    }

    /// Creates a pending order from the user's cart. A coupon given here is
    /// validated and staged on the order row; its counter moves only at
    /// confirmation, so an order that is never paid never consumes a use.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<CheckoutResponse, ServiceError> {
        let cart = self.cart.get_cart(user_id).await?;
        if cart.items.is_empty() {
            return Err(ServiceError::CartEmpty);
        }

        let applied = match input.coupon_code.as_deref() {
            Some(code) => Some(self.coupons.validate(code, cart.total).await?),
            None => None,
        };
        let discount = applied.map(|a| a.discount_amount).unwrap_or(Decimal::ZERO);
        let total_amount = (cart.total - discount).max(Decimal::ZERO);

        let intent = self.gateway.create_payment_intent(total_amount).await?;

        let order_id = Uuid::new_v4();
        let order_number = generate_order_number(order_id);
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let order_row = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            order_number: Set(order_number.clone()),
            total_amount: Set(total_amount),
            payment_status: Set(PaymentStatus::Pending),
            payment_provider: Set(PAYMENT_PROVIDER.to_string()),
            payment_transaction_id: Set(Some(intent.id.clone())),
            pending_coupon_id: Set(applied.map(|a| a.coupon_id)),
            pending_discount_amount: Set(applied.map(|a| a.discount_amount)),
            idempotency_key: Set(input.idempotency_key),
            created_at: Set(now),
            updated_at: Set(now),
        };
        order_row.insert(&txn).await?;

        for item in &cart.items {
            let snapshot = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                course_id: Set(item.id),
                pricing_tier: Set(item.pricing_tier),
                base_price: Set(item.price),
            };
            snapshot.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!(%order_id, %order_number, %total_amount, "created order");
        Ok(CheckoutResponse {
            id: order_id,
            order_number,
            total_amount,
            payment_intent: intent.id,
            client_secret: intent.client_secret,
        })
    }

    /// Finalizes an order once the provider reports the intent succeeded.
    /// Safe to call repeatedly: a completed order short-circuits, and the
    /// finalize sequence re-checks status under a row lock.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
    ) -> Result<ConfirmPaymentResponse, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        if order.payment_status == PaymentStatus::Completed {
            let enrolled = self.order_course_ids(order_id).await?;
            return Ok(ConfirmPaymentResponse::completed(enrolled));
        }

        let transaction_id = order.payment_transaction_id.clone().ok_or_else(|| {
            ServiceError::PaymentFailed("Order has no payment transaction".to_string())
        })?;

        let intent = self.gateway.retrieve_payment_intent(&transaction_id).await?;
        if !intent.is_succeeded() {
            // Nothing is mutated; the client may retry once payment settles.
            return Ok(ConfirmPaymentResponse {
                status: intent.status,
                enrolled_courses: vec![],
            });
        }

        let txn = self.db.begin().await?;

        // Re-read under a row lock. SQLite serializes writers on its own,
        // so FOR UPDATE is only issued on Postgres.
        let mut query = Order::find_by_id(order_id);
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        let locked = query
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        if locked.payment_status == PaymentStatus::Completed {
            txn.commit().await?;
            let enrolled = self.order_course_ids(order_id).await?;
            return Ok(ConfirmPaymentResponse::completed(enrolled));
        }

        let user_id = locked.user_id;
        let pending_coupon = locked.pending_coupon_id;
        let pending_discount = locked.pending_discount_amount.unwrap_or(Decimal::ZERO);

        let mut active: order::ActiveModel = locked.into();
        active.payment_status = Set(PaymentStatus::Completed);
        active.pending_coupon_id = Set(None);
        active.pending_discount_amount = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        let mut coupon_redeemed = None;
        if let Some(coupon_id) = pending_coupon {
            if self
                .coupons
                .redeem(&txn, coupon_id, user_id, order_id, pending_discount)
                .await?
            {
                coupon_redeemed = Some(coupon_id);
            }
        }

        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        let mut enrolled_courses = Vec::with_capacity(items.len());
        let mut new_enrollments = Vec::new();
        for item in &items {
            enrolled_courses.push(item.course_id);

            let existing = UserCourseProgress::find()
                .filter(user_course_progress::Column::UserId.eq(user_id))
                .filter(user_course_progress::Column::CourseId.eq(item.course_id))
                .one(&txn)
                .await?;
            if existing.is_none() {
                let now = Utc::now();
                let enrollment = user_course_progress::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    course_id: Set(item.course_id),
                    progress_percentage: Set(Decimal::ZERO),
                    pricing_tier: Set(item.pricing_tier),
                    status: Set(EnrollmentStatus::Enrolled),
                    enrolled_at: Set(now),
                    updated_at: Set(now),
                };
                enrollment.insert(&txn).await?;
                new_enrollments.push(item.course_id);
            }
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentConfirmed {
                order_id,
                transaction_id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::OrderCompleted(order_id))
            .await;
        if let Some(coupon_id) = coupon_redeemed {
            self.event_sender
                .send_or_log(Event::CouponRedeemed { coupon_id, order_id })
                .await;
        }
        for course_id in &new_enrollments {
            self.event_sender
                .send_or_log(Event::EnrollmentCreated {
                    user_id,
                    course_id: *course_id,
                })
                .await;
        }

        info!(%order_id, courses = enrolled_courses.len(), "payment confirmed, order completed");
        Ok(ConfirmPaymentResponse::completed(enrolled_courses))
    }

    /// The user's order history, newest first.
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderSummary>, u64), ServiceError> {
        let paginator = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders.into_iter().map(OrderSummary::from).collect(), total))
    }

    async fn order_course_ids(&self, order_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(items.into_iter().map(|i| i.course_id).collect())
    }
}

/// Time-derived order number, made collision-proof with an id fragment.
fn generate_order_number(order_id: Uuid) -> String {
    let fragment = order_id.simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d%H%M%S"), fragment)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub coupon_code: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    pub payment_intent: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    /// `completed`, or the provider's status verbatim when not finalized
    pub status: String,
    pub enrolled_courses: Vec<Uuid>,
}

impl ConfirmPaymentResponse {
    fn completed(enrolled_courses: Vec<Uuid>) -> Self {
        Self {
            status: "completed".to_string(),
            enrolled_courses,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<order::Model> for OrderSummary {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            total_amount: model.total_amount,
            payment_status: model.payment_status,
            created_at: model.created_at,
        }
    }
}
