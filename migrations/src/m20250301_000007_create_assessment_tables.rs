use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quizzes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quizzes::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Quizzes::ChapterId).uuid().not_null())
                    .col(ColumnDef::new(Quizzes::Title).string().not_null())
                    .col(ColumnDef::new(Quizzes::Questions).json().not_null())
                    .col(
                        ColumnDef::new(Quizzes::PassingScore)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(70),
                    )
                    .col(ColumnDef::new(Quizzes::TimeLimitMinutes).integer().null())
                    .col(
                        ColumnDef::new(Quizzes::AttemptsAllowed)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuizAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuizAttempts::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuizAttempts::UserId).uuid().not_null())
                    .col(ColumnDef::new(QuizAttempts::QuizId).uuid().not_null())
                    .col(
                        ColumnDef::new(QuizAttempts::AttemptNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuizAttempts::Score).decimal_len(5, 2).null())
                    .col(ColumnDef::new(QuizAttempts::Answers).json().null())
                    .col(
                        ColumnDef::new(QuizAttempts::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::TimeTakenMinutes)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(QuizAttempts::IsPassed).boolean().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_attempts_user_quiz")
                    .table(QuizAttempts::Table)
                    .col(QuizAttempts::UserId)
                    .col(QuizAttempts::QuizId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Certificates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificates::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificates::UserId).uuid().not_null())
                    .col(ColumnDef::new(Certificates::CourseId).uuid().not_null())
                    .col(
                        ColumnDef::new(Certificates::CertificateNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Certificates::VerificationCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificates::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificates::IsValid)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuizAttempts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quizzes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Quizzes {
    Table,
    Id,
    ChapterId,
    Title,
    Questions,
    PassingScore,
    TimeLimitMinutes,
    AttemptsAllowed,
}

#[derive(Iden)]
enum QuizAttempts {
    Table,
    Id,
    UserId,
    QuizId,
    AttemptNumber,
    Score,
    Answers,
    StartedAt,
    CompletedAt,
    TimeTakenMinutes,
    IsPassed,
}

#[derive(Iden)]
enum Certificates {
    Table,
    Id,
    UserId,
    CourseId,
    CertificateNumber,
    VerificationCode,
    IssuedAt,
    IsValid,
}
