mod common;

use common::{seed_course, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use learnhub_api::{
    entities::PricingTier,
    errors::ServiceError,
    services::cart::AddToCartInput,
};

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn add_item_captures_tier_price() {
    let app = TestApp::new().await;
    let course_id = seed_course(
        &app,
        &[(PricingTier::Basic, dec!(10.00)), (PricingTier::Pro, dec!(25.00))],
    )
    .await;
    let user_id = Uuid::new_v4();

    let result = app
        .state
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

    assert_eq!(result.cart_item.price, dec!(10.00));
    assert_eq!(result.cart_item.pricing_tier, PricingTier::Basic);
    assert_eq!(result.cart_total, dec!(10.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn readding_replaces_tier_and_price() {
    let app = TestApp::new().await;
    let course_id = seed_course(
        &app,
        &[(PricingTier::Basic, dec!(10.00)), (PricingTier::Pro, dec!(25.00))],
    )
    .await;
    let user_id = Uuid::new_v4();

    for tier in [PricingTier::Basic, PricingTier::Pro] {
        app.state
            .services
            .cart
            .add_item(
                user_id,
                AddToCartInput {
                    course_id,
                    pricing_tier: tier,
                },
            )
            .await
            .expect("add to cart");
    }

    let cart = app.state.services.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.item_count, 1, "one row per (user, course)");
    assert_eq!(cart.items[0].pricing_tier, PricingTier::Pro);
    assert_eq!(cart.items[0].price, dec!(25.00));
    assert_eq!(cart.total, dec!(25.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn total_sums_item_prices() {
    let app = TestApp::new().await;
    let first = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let second = seed_course(&app, &[(PricingTier::Basic, dec!(14.50))]).await;
    let user_id = Uuid::new_v4();

    for course_id in [first, second] {
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

    let cart = app.state.services.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.total, dec!(24.50));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unknown_course_rejected() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .cart
        .add_item(
            Uuid::new_v4(),
            AddToCartInput {
                course_id: Uuid::new_v4(),
                pricing_tier: PricingTier::Basic,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CourseNotFound));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn missing_tier_rejected() {
    let app = TestApp::new().await;
    // Course only has a basic price
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;

    let err = app
        .state
        .services
        .cart
        .add_item(
            Uuid::new_v4(),
            AddToCartInput {
                course_id,
                pricing_tier: PricingTier::Premium,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn remove_on_empty_cart_returns_zero() {
    let app = TestApp::new().await;

    let total = app
        .state
        .services
        .cart
        .remove_item(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect("idempotent remove");
    assert_eq!(total, Decimal::ZERO);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn remove_drops_row_and_recomputes_total() {
    let app = TestApp::new().await;
    let first = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let second = seed_course(&app, &[(PricingTier::Basic, dec!(5.00))]).await;
    let user_id = Uuid::new_v4();

    for course_id in [first, second] {
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
            .unwrap();
    }

    let total = app
        .state
        .services
        .cart
        .remove_item(user_id, first)
        .await
        .unwrap();
    assert_eq!(total, dec!(5.00));

    let cart = app.state.services.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.item_count, 1);
    assert_eq!(cart.items[0].id, second);
}
