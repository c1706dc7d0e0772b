mod common;

use common::{seed_coupon, seed_course, TestApp};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use learnhub_api::{
    entities::{
        coupon, coupon_usage, user_course_progress, CartItem, Coupon, CouponUsage,
        DiscountType, EnrollmentStatus, PaymentStatus, PricingTier, UserCourseProgress,
    },
    errors::ServiceError,
    services::{cart::AddToCartInput, orders::CreateOrderInput},
};

async fn add_basic_course_to_cart(app: &TestApp, user_id: Uuid, course_id: Uuid) {
    app.state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                course_id,
                pricing_tier: PricingTier::Basic,
            },
        )
        .await
        .expect("add to cart");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn empty_cart_cannot_checkout() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .orders
        .create_order(Uuid::new_v4(), CreateOrderInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CartEmpty));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn coupon_checkout_happy_path() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let coupon_id = seed_coupon(&app, "SAVE10", DiscountType::Percentage, dec!(10), Some(1)).await;
    let user_id = Uuid::new_v4();

    add_basic_course_to_cart(&app, user_id, course_id).await;

    // spec example: subtotal 10.00, 10% coupon -> total 9.00
    let order = app
        .state
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderInput {
                coupon_code: Some("SAVE10".to_string()),
                idempotency_key: None,
            },
        )
        .await
        .expect("create order");

    assert_eq!(order.total_amount, dec!(9.00));
    assert!(order.order_number.starts_with("ORD-"));
    assert!(order.client_secret.is_some());
    assert_eq!(app.gateway.last_amount(), Some(dec!(9.00)));

    // Coupon is only staged: the counter must not move before payment.
    let coupon_row = Coupon::find_by_id(coupon_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon_row.used_count, 0);

    // Payment not settled yet: confirm must not mutate anything.
    app.gateway.set_succeed(false);
    let pending = app
        .state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .expect("confirm while pending");
    assert_ne!(pending.status, "completed");
    assert!(pending.enrolled_courses.is_empty());

    let cart_rows = CartItem::find().all(&*app.state.db).await.unwrap();
    assert_eq!(cart_rows.len(), 1, "cart untouched while payment pending");

    // Payment settles.
    app.gateway.set_succeed(true);
    let confirmed = app
        .state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .expect("confirm payment");

    assert_eq!(confirmed.status, "completed");
    assert_eq!(confirmed.enrolled_courses, vec![course_id]);

    // Order completed, staged coupon cleared.
    let order_row = learnhub_api::entities::Order::find_by_id(order.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order_row.payment_status, PaymentStatus::Completed);
    assert!(order_row.pending_coupon_id.is_none());

    // Coupon redeemed exactly once, with an audit row.
    let coupon_row = Coupon::find_by_id(coupon_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon_row.used_count, 1);

    let usage: Vec<coupon_usage::Model> = CouponUsage::find().all(&*app.state.db).await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].order_id, order.id);
    assert_eq!(usage[0].discount_amount, dec!(1.00));

    // Cart cleared, enrollment written with the purchased tier.
    let cart_rows = CartItem::find().all(&*app.state.db).await.unwrap();
    assert!(cart_rows.is_empty());

    let enrollments: Vec<user_course_progress::Model> =
        UserCourseProgress::find().all(&*app.state.db).await.unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].user_id, user_id);
    assert_eq!(enrollments[0].course_id, course_id);
    assert_eq!(enrollments[0].pricing_tier, PricingTier::Basic);
    assert_eq!(enrollments[0].status, EnrollmentStatus::Enrolled);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn confirm_payment_is_idempotent() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let coupon_id = seed_coupon(&app, "ONCE", DiscountType::Fixed, dec!(2.00), Some(5)).await;
    let user_id = Uuid::new_v4();

    add_basic_course_to_cart(&app, user_id, course_id).await;
    let order = app
        .state
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderInput {
                coupon_code: Some("ONCE".to_string()),
                idempotency_key: None,
            },
        )
        .await
        .unwrap();

    let first = app
        .state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .unwrap();
    let second = app
        .state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .unwrap();

    assert_eq!(first.status, "completed");
    assert_eq!(second.status, "completed");
    assert_eq!(second.enrolled_courses, vec![course_id]);

    let coupon_row: coupon::Model = Coupon::find_by_id(coupon_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon_row.used_count, 1, "second confirm must not re-redeem");

    let usage = CouponUsage::find().all(&*app.state.db).await.unwrap();
    assert_eq!(usage.len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn exhausted_coupon_rejected_at_create() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    seed_coupon(&app, "LIMIT1", DiscountType::Percentage, dec!(10), Some(1)).await;

    // First buyer redeems the single use.
    let first_user = Uuid::new_v4();
    add_basic_course_to_cart(&app, first_user, course_id).await;
    let order = app
        .state
        .services
        .orders
        .create_order(
            first_user,
            CreateOrderInput {
                coupon_code: Some("LIMIT1".to_string()),
                idempotency_key: None,
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .unwrap();

    // Second buyer now fails validation at order creation.
    let second_user = Uuid::new_v4();
    add_basic_course_to_cart(&app, second_user, course_id).await;
    let err = app
        .state
        .services
        .orders
        .create_order(
            second_user,
            CreateOrderInput {
                coupon_code: Some("LIMIT1".to_string()),
                idempotency_key: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn fixed_coupon_clamped_to_subtotal() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    seed_coupon(&app, "BIGFIX", DiscountType::Fixed, dec!(50.00), None).await;
    let user_id = Uuid::new_v4();

    add_basic_course_to_cart(&app, user_id, course_id).await;
    let order = app
        .state
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderInput {
                coupon_code: Some("BIGFIX".to_string()),
                idempotency_key: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(order.total_amount, dec!(0.00), "total never goes negative");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn checkout_without_coupon() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(19.99))]).await;
    let user_id = Uuid::new_v4();

    add_basic_course_to_cart(&app, user_id, course_id).await;
    let order = app
        .state
        .services
        .orders
        .create_order(user_id, CreateOrderInput::default())
        .await
        .unwrap();

    assert_eq!(order.total_amount, dec!(19.99));
    assert_eq!(app.gateway.last_amount(), Some(dec!(19.99)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unknown_order_confirm_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .orders
        .confirm_payment(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
