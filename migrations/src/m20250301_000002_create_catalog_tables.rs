use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Instructors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Instructors::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Instructors::DisplayName).string().not_null())
                    .col(ColumnDef::new(Instructors::Title).string().null())
                    .col(ColumnDef::new(Instructors::AvatarUrl).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).text().not_null())
                    .col(ColumnDef::new(Courses::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Courses::InstructorId).uuid().not_null())
                    .col(ColumnDef::new(Courses::ImageUrl).string().null())
                    .col(
                        ColumnDef::new(Courses::Level)
                            .string_len(20)
                            .not_null()
                            .default("beginner"),
                    )
                    .col(ColumnDef::new(Courses::DurationMinutes).integer().null())
                    .col(
                        ColumnDef::new(Courses::Language)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(Courses::Rating)
                            .decimal_len(3, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Courses::StudentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Courses::Tags).json().null())
                    .col(
                        ColumnDef::new(Courses::IsCertified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Courses::IsPublished)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_category")
                    .table(Courses::Table)
                    .col(Courses::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CoursePricing::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CoursePricing::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CoursePricing::CourseId).uuid().not_null())
                    .col(
                        ColumnDef::new(CoursePricing::Tier)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CoursePricing::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CoursePricing::OriginalPrice)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_pricing_course_tier")
                    .table(CoursePricing::Table)
                    .col(CoursePricing::CourseId)
                    .col(CoursePricing::Tier)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Chapters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chapters::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Chapters::CourseId).uuid().not_null())
                    .col(ColumnDef::new(Chapters::Title).string().not_null())
                    .col(ColumnDef::new(Chapters::Description).text().null())
                    .col(
                        ColumnDef::new(Chapters::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Chapters::EstimatedDurationMinutes)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Chapters::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chapters_course")
                    .table(Chapters::Table)
                    .col(Chapters::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Lessons::ChapterId).uuid().not_null())
                    .col(ColumnDef::new(Lessons::Title).string().not_null())
                    .col(
                        ColumnDef::new(Lessons::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Lessons::DurationSeconds).integer().null())
                    .col(ColumnDef::new(Lessons::VideoUrl).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lessons_chapter")
                    .table(Lessons::Table)
                    .col(Lessons::ChapterId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chapters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CoursePricing::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Instructors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    IsActive,
}

#[derive(Iden)]
enum Instructors {
    Table,
    Id,
    DisplayName,
    Title,
    AvatarUrl,
}

#[derive(Iden)]
enum Courses {
    Table,
    Id,
    Title,
    Description,
    CategoryId,
    InstructorId,
    ImageUrl,
    Level,
    DurationMinutes,
    Language,
    Rating,
    StudentCount,
    Tags,
    IsCertified,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CoursePricing {
    Table,
    Id,
    CourseId,
    Tier,
    Price,
    OriginalPrice,
}

#[derive(Iden)]
enum Chapters {
    Table,
    Id,
    CourseId,
    Title,
    Description,
    SortOrder,
    EstimatedDurationMinutes,
    IsLocked,
}

#[derive(Iden)]
enum Lessons {
    Table,
    Id,
    ChapterId,
    Title,
    SortOrder,
    DurationSeconds,
    VideoUrl,
}
