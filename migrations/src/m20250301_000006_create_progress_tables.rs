use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserCourseProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCourseProgress::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserCourseProgress::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserCourseProgress::CourseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCourseProgress::ProgressPercentage)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserCourseProgress::PricingTier)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCourseProgress::Status)
                            .string_len(20)
                            .not_null()
                            .default("enrolled"),
                    )
                    .col(
                        ColumnDef::new(UserCourseProgress::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserCourseProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_course_progress_user_course")
                    .table(UserCourseProgress::Table)
                    .col(UserCourseProgress::UserId)
                    .col(UserCourseProgress::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserLessonProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLessonProgress::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserLessonProgress::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserLessonProgress::LessonId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserLessonProgress::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserLessonProgress::WatchTimeSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UserLessonProgress::CompletionDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserLessonProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_lesson_progress_user_lesson")
                    .table(UserLessonProgress::Table)
                    .col(UserLessonProgress::UserId)
                    .col(UserLessonProgress::LessonId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLessonProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCourseProgress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserCourseProgress {
    Table,
    Id,
    UserId,
    CourseId,
    ProgressPercentage,
    PricingTier,
    Status,
    EnrolledAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserLessonProgress {
    Table,
    Id,
    UserId,
    LessonId,
    IsCompleted,
    WatchTimeSeconds,
    CompletionDate,
    UpdatedAt,
}
