#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use learnhub_api::{
    auth::{AuthConfig, AuthService},
    cache::InMemoryCache,
    config::AppConfig,
    db,
    entities::{
        category, chapter, coupon, course, course_pricing, instructor, lesson, quiz, DiscountType,
        PricingTier,
    },
    errors::ServiceError,
    events,
    handlers::AppServices,
    rate_limiter::RateLimiter,
    services::{PaymentGateway, PaymentIntent},
    AppState,
};

/// Payment gateway double. Intent creation always succeeds; whether the
/// intent later reports `succeeded` is controlled by the test.
pub struct FakeGateway {
    succeed: AtomicBool,
    counter: AtomicU64,
    pub created_amounts: Mutex<Vec<Decimal>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            succeed: AtomicBool::new(true),
            counter: AtomicU64::new(0),
            created_amounts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_succeed(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
    }

    pub fn last_amount(&self) -> Option<Decimal> {
        self.created_amounts.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(&self, amount: Decimal) -> Result<PaymentIntent, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.created_amounts.lock().unwrap().push(amount);
        Ok(PaymentIntent {
            id: format!("pi_test_{n}"),
            client_secret: Some(format!("pi_test_{n}_secret")),
            status: "requires_payment_method".to_string(),
            amount: 0,
        })
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError> {
        let status = if self.succeed.load(Ordering::SeqCst) {
            "succeeded"
        } else {
            "requires_payment_method"
        };
        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: None,
            status: status.to_string(),
            amount: 0,
        })
    }
}

/// Application harness over a fresh SQLite database in a temp directory.
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    #[allow(dead_code)]
    pub router: Router,
    _tmp: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("learnhub_test.db");

        let cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_long_enough_for_validation!".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(FakeGateway::new());
        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            gateway.clone() as Arc<dyn PaymentGateway>,
        );

        let auth = Arc::new(AuthService::new(
            AuthConfig::new(
                cfg.jwt_secret.clone(),
                Duration::from_secs(cfg.jwt_expiration),
                Duration::from_secs(cfg.refresh_token_expiration),
            ),
            db.clone(),
        ));

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
            auth,
            cache: Arc::new(InMemoryCache::new()),
            rate_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
        };

        let router = Router::new()
            .nest("/api", learnhub_api::api_routes())
            .with_state(state.clone());

        Self {
            state,
            gateway,
            router,
            _tmp: tmp,
            _event_task: event_task,
        }
    }
}

/// Seeds a category + instructor + course with the given tier prices.
pub async fn seed_course(app: &TestApp, prices: &[(PricingTier, Decimal)]) -> Uuid {
    let category_id = Uuid::new_v4();
    category::ActiveModel {
        id: Set(category_id),
        name: Set(format!("Category {category_id}")),
        is_active: Set(true),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed category");

    let instructor_id = Uuid::new_v4();
    instructor::ActiveModel {
        id: Set(instructor_id),
        display_name: Set("Jane Smith".to_string()),
        title: Set(Some("Senior Engineer".to_string())),
        avatar_url: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed instructor");

    let course_id = Uuid::new_v4();
    course::ActiveModel {
        id: Set(course_id),
        title: Set("Practical Rust".to_string()),
        description: Set("Systems programming from the ground up".to_string()),
        category_id: Set(category_id),
        instructor_id: Set(instructor_id),
        image_url: Set(None),
        level: Set("beginner".to_string()),
        duration_minutes: Set(Some(600)),
        language: Set("en".to_string()),
        rating: Set(Decimal::ZERO),
        student_count: Set(0),
        tags: Set(None),
        is_certified: Set(true),
        is_published: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed course");

    for (tier, price) in prices {
        course_pricing::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course_id),
            tier: Set(*tier),
            price: Set(*price),
            original_price: Set(None),
        }
        .insert(&*app.state.db)
        .await
        .expect("seed pricing");
    }

    course_id
}

/// Adds `lessons_per_chapter` lessons to each of `chapters` new chapters.
/// Returns the lesson ids in order.
pub async fn seed_lessons(
    app: &TestApp,
    course_id: Uuid,
    chapters: usize,
    lessons_per_chapter: usize,
) -> Vec<Uuid> {
    let mut lesson_ids = Vec::new();
    for c in 0..chapters {
        let chapter_id = Uuid::new_v4();
        chapter::ActiveModel {
            id: Set(chapter_id),
            course_id: Set(course_id),
            title: Set(format!("Chapter {}", c + 1)),
            description: Set(None),
            sort_order: Set(c as i32),
            estimated_duration_minutes: Set(Some(30)),
            is_locked: Set(false),
        }
        .insert(&*app.state.db)
        .await
        .expect("seed chapter");

        for l in 0..lessons_per_chapter {
            let lesson_id = Uuid::new_v4();
            lesson::ActiveModel {
                id: Set(lesson_id),
                chapter_id: Set(chapter_id),
                title: Set(format!("Lesson {}.{}", c + 1, l + 1)),
                sort_order: Set(l as i32),
                duration_seconds: Set(Some(300)),
                video_url: Set(None),
            }
            .insert(&*app.state.db)
            .await
            .expect("seed lesson");
            lesson_ids.push(lesson_id);
        }
    }
    lesson_ids
}

/// Seeds a chapter with a two-question quiz. Correct answers are option 1
/// for question 1 and option 2 for question 2.
pub async fn seed_quiz(
    app: &TestApp,
    course_id: Uuid,
    passing_score: Decimal,
    attempts_allowed: i32,
) -> Uuid {
    let chapter_id = Uuid::new_v4();
    chapter::ActiveModel {
        id: Set(chapter_id),
        course_id: Set(course_id),
        title: Set("Assessment".to_string()),
        description: Set(None),
        sort_order: Set(99),
        estimated_duration_minutes: Set(None),
        is_locked: Set(false),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed quiz chapter");

    let quiz_id = Uuid::new_v4();
    quiz::ActiveModel {
        id: Set(quiz_id),
        chapter_id: Set(chapter_id),
        title: Set("Final quiz".to_string()),
        questions: Set(serde_json::json!([
            {
                "id": 1,
                "prompt": "What does ownership prevent?",
                "options": [{"id": 1, "text": "Data races"}, {"id": 2, "text": "Nothing"}],
                "correct_answer_id": 1
            },
            {
                "id": 2,
                "prompt": "What does ? do?",
                "options": [{"id": 1, "text": "Panics"}, {"id": 2, "text": "Propagates errors"}],
                "correct_answer_id": 2
            }
        ])),
        passing_score: Set(passing_score),
        time_limit_minutes: Set(Some(30)),
        attempts_allowed: Set(attempts_allowed),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed quiz");

    quiz_id
}

/// Seeds an active coupon valid for the next 30 days.
pub async fn seed_coupon(
    app: &TestApp,
    code: &str,
    discount_type: DiscountType,
    discount_value: Decimal,
    usage_limit: Option<i32>,
) -> Uuid {
    let id = Uuid::new_v4();
    coupon::ActiveModel {
        id: Set(id),
        code: Set(code.to_string()),
        discount_type: Set(discount_type),
        discount_value: Set(discount_value),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        valid_from: Set(Utc::now() - chrono::Duration::days(1)),
        valid_until: Set(Utc::now() + chrono::Duration::days(30)),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&*app.state.db)
    .await
    .expect("seed coupon");
    id
}
