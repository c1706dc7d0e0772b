use utoipa::OpenApi;

/// OpenAPI document for the HTTP surface, served at
/// `/api/docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LearnHub API",
        description = "E-learning marketplace backend: catalog, cart, coupon checkout, enrollment, progress, assessments and certificates"
    ),
    components(schemas(
        crate::errors::ErrorBody,
        crate::entities::PricingTier,
        crate::entities::DiscountType,
        crate::entities::PaymentStatus,
        crate::entities::EnrollmentStatus,
        crate::auth::TokenPair,
        crate::handlers::auth::RegisterRequest,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::RefreshRequest,
        crate::handlers::auth::UserView,
        crate::handlers::progress::WatchTimeRequest,
        crate::handlers::assessments::SubmitAttemptRequest,
        crate::services::cart::CartCourseSummary,
        crate::services::cart::CartItemView,
        crate::services::cart::CartSnapshot,
        crate::services::cart::AddToCartResult,
        crate::services::orders::CheckoutResponse,
        crate::services::orders::ConfirmPaymentResponse,
        crate::services::orders::OrderSummary,
        crate::services::enrollment::WatchTimeResult,
        crate::services::enrollment::CompleteLessonResult,
        crate::services::enrollment::CourseProgress,
        crate::services::assessments::AnswerInput,
        crate::services::assessments::AttemptStarted,
        crate::services::assessments::AttemptResult,
        crate::services::catalog::TierPrice,
        crate::services::catalog::InstructorView,
        crate::services::catalog::CourseSummary,
        crate::services::catalog::ChapterView,
        crate::services::catalog::CourseDetail,
        crate::services::catalog::Pagination,
        crate::services::catalog::PriceRange,
        crate::services::catalog::FilterOptions,
        crate::services::catalog::CourseListResponse,
    )),
    tags(
        (name = "Auth", description = "Registration, login and token refresh"),
        (name = "Courses", description = "Public course catalog"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Orders", description = "Checkout and payment confirmation"),
        (name = "Progress", description = "Lesson and course progress tracking"),
        (name = "Assessments", description = "Quiz attempts and certificates"),
        (name = "Coupons", description = "Coupon administration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "LearnHub API");
        assert!(doc.components.is_some());
    }
}
