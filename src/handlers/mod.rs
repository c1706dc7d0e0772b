pub mod assessments;
pub mod auth;
pub mod cart;
pub mod common;
pub mod coupons;
pub mod courses;
pub mod orders;
pub mod progress;

use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        AssessmentService, CartService, CatalogService, CertificateService, CouponService,
        OrderService, PaymentGateway, PricingService, ProgressService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Service container wired once at startup and shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub pricing: Arc<PricingService>,
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub progress: Arc<ProgressService>,
    pub certificates: Arc<CertificateService>,
    pub assessments: Arc<AssessmentService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let pricing = Arc::new(PricingService::new(db.clone()));
        let catalog = Arc::new(CatalogService::new(db.clone(), pricing.clone()));
        let cart = Arc::new(CartService::new(
            db.clone(),
            event_sender.clone(),
            pricing.clone(),
        ));
        let coupons = Arc::new(CouponService::new(db.clone()));
        let orders = Arc::new(OrderService::new(
            db.clone(),
            event_sender.clone(),
            gateway,
            coupons.clone(),
            cart.clone(),
        ));
        let progress = Arc::new(ProgressService::new(db.clone(), event_sender.clone()));
        let certificates = Arc::new(CertificateService::new(db.clone(), event_sender.clone()));
        let assessments = Arc::new(AssessmentService::new(
            db,
            event_sender,
            certificates.clone(),
        ));

        Self {
            pricing,
            catalog,
            cart,
            coupons,
            orders,
            progress,
            certificates,
            assessments,
        }
    }
}
