use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::UserId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::CourseId).uuid().not_null())
                    .col(
                        ColumnDef::new(CartItems::PricingTier)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (user, course); re-adding replaces tier and price.
        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_user_course")
                    .table(CartItems::Table)
                    .col(CartItems::UserId)
                    .col(CartItems::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CartItems {
    Table,
    Id,
    UserId,
    CourseId,
    PricingTier,
    UnitPrice,
    AddedAt,
}
