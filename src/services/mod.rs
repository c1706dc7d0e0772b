pub mod assessments;
pub mod cart;
pub mod catalog;
pub mod certificates;
pub mod coupons;
pub mod enrollment;
pub mod orders;
pub mod payments;
pub mod pricing;

pub use assessments::AssessmentService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use certificates::CertificateService;
pub use coupons::CouponService;
pub use enrollment::ProgressService;
pub use orders::OrderService;
pub use payments::{PaymentGateway, PaymentIntent, StripeGateway};
pub use pricing::PricingService;
