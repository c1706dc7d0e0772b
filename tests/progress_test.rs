mod common;

use common::{seed_course, seed_lessons, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use learnhub_api::{
    entities::{user_course_progress, EnrollmentStatus, PricingTier, UserCourseProgress},
    errors::ServiceError,
    services::{cart::AddToCartInput, orders::CreateOrderInput},
};

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn watch_time_accumulates() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let lessons = seed_lessons(&app, course_id, 1, 1).await;
    let user_id = Uuid::new_v4();

    let first = app
        .state
        .services
        .progress
        .record_watch_time(user_id, lessons[0], 30)
        .await
        .unwrap();
    assert_eq!(first.watch_time_seconds, 30);

    let second = app
        .state
        .services
        .progress
        .record_watch_time(user_id, lessons[0], 45)
        .await
        .unwrap();
    assert_eq!(second.watch_time_seconds, 75);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn negative_watch_time_rejected() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let lessons = seed_lessons(&app, course_id, 1, 1).await;

    let err = app
        .state
        .services
        .progress
        .record_watch_time(Uuid::new_v4(), lessons[0], -5)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn two_of_four_lessons_is_fifty_percent() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let lessons = seed_lessons(&app, course_id, 2, 2).await;
    let user_id = Uuid::new_v4();

    app.state
        .services
        .progress
        .complete_lesson(user_id, lessons[0])
        .await
        .unwrap();
    let result = app
        .state
        .services
        .progress
        .complete_lesson(user_id, lessons[1])
        .await
        .unwrap();

    assert_eq!(result.progress_percentage, dec!(50.00));
    assert_eq!(result.completed_lessons, 2);
    assert_eq!(result.total_lessons, 4);

    let progress = app
        .state
        .services
        .progress
        .get_course_progress(user_id, course_id)
        .await
        .unwrap();
    assert_eq!(progress.progress_percentage, dec!(50.00));
    assert_eq!(progress.completed_lessons.len(), 2);
    assert!(progress.completed_lessons.contains(&lessons[0]));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn completing_twice_is_idempotent() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let lessons = seed_lessons(&app, course_id, 1, 2).await;
    let user_id = Uuid::new_v4();

    app.state
        .services
        .progress
        .complete_lesson(user_id, lessons[0])
        .await
        .unwrap();
    let repeat = app
        .state
        .services
        .progress
        .complete_lesson(user_id, lessons[0])
        .await
        .unwrap();

    assert_eq!(repeat.progress_percentage, dec!(50.00));
    assert_eq!(repeat.completed_lessons, 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn full_completion_marks_course_completed() {
    let app = TestApp::new().await;
    let course_id = seed_course(&app, &[(PricingTier::Basic, dec!(10.00))]).await;
    let lessons = seed_lessons(&app, course_id, 1, 2).await;
    let user_id = Uuid::new_v4();

    for lesson in &lessons {
        app.state
            .services
            .progress
            .complete_lesson(user_id, *lesson)
            .await
            .unwrap();
    }

    let rows: Vec<user_course_progress::Model> =
        UserCourseProgress::find().all(&*app.state.db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].progress_percentage, dec!(100.00));
    assert_eq!(rows[0].status, EnrollmentStatus::Completed);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn progress_row_keeps_purchased_tier() {
    let app = TestApp::new().await;
    let course_id = seed_course(
        &app,
        &[(PricingTier::Basic, dec!(10.00)), (PricingTier::Pro, dec!(25.00))],
    )
    .await;
    let lessons = seed_lessons(&app, course_id, 1, 2).await;
    let user_id = Uuid::new_v4();

    // Buy the pro tier; confirmation writes the enrollment row.
    app.state
        .services
        .cart
        .add_item(
            user_id,
            AddToCartInput {
                course_id,
                pricing_tier: PricingTier::Pro,
            },
        )
        .await
        .unwrap();
    let order = app
        .state
        .services
        .orders
        .create_order(user_id, CreateOrderInput::default())
        .await
        .unwrap();
    app.state
        .services
        .orders
        .confirm_payment(order.id)
        .await
        .unwrap();

    app.state
        .services
        .progress
        .complete_lesson(user_id, lessons[0])
        .await
        .unwrap();

    let rows = UserCourseProgress::find().all(&*app.state.db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pricing_tier, PricingTier::Pro, "tier survives recompute");
    assert_eq!(rows[0].progress_percentage, dec!(50.00));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unknown_course_progress_is_zero() {
    let app = TestApp::new().await;
    let progress = app
        .state
        .services
        .progress
        .get_course_progress(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(progress.progress_percentage, Decimal::ZERO);
    assert!(progress.completed_lessons.is_empty());
}
