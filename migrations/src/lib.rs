pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_catalog_tables;
mod m20250301_000003_create_cart_items_table;
mod m20250301_000004_create_coupon_tables;
mod m20250301_000005_create_order_tables;
mod m20250301_000006_create_progress_tables;
mod m20250301_000007_create_assessment_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_catalog_tables::Migration),
            Box::new(m20250301_000003_create_cart_items_table::Migration),
            Box::new(m20250301_000004_create_coupon_tables::Migration),
            Box::new(m20250301_000005_create_order_tables::Migration),
            Box::new(m20250301_000006_create_progress_tables::Migration),
            Box::new(m20250301_000007_create_assessment_tables::Migration),
        ]
    }
}
