use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        chapter, lesson, order, order_item, user_course_progress, user_lesson_progress,
        EnrollmentStatus, Lesson, OrderItem, PaymentStatus, PricingTier, UserCourseProgress,
        UserLessonProgress,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Tracks per-lesson watch time and completion, rolling both into a
/// per-course percentage.
#[derive(Clone)]
pub struct ProgressService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProgressService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds watched seconds to the user's lesson row. Repeat calls
    /// accumulate; the operation never fails on re-reporting.
    #[instrument(skip(self))]
    pub async fn record_watch_time(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        seconds: i32,
    ) -> Result<WatchTimeResult, ServiceError> {
        if seconds < 0 {
            return Err(ServiceError::ValidationError(
                "Watch time must be non-negative".to_string(),
            ));
        }

        Lesson::find_by_id(lesson_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lesson not found".to_string()))?;

        let txn = self.db.begin().await?;

        let existing = UserLessonProgress::find()
            .filter(user_lesson_progress::Column::UserId.eq(user_id))
            .filter(user_lesson_progress::Column::LessonId.eq(lesson_id))
            .one(&txn)
            .await?;

        let total_seconds = match existing {
            Some(row) => {
                let accumulated = row.watch_time_seconds + seconds;
                let mut row: user_lesson_progress::ActiveModel = row.into();
                row.watch_time_seconds = Set(accumulated);
                row.updated_at = Set(Utc::now());
                row.update(&txn).await?;
                accumulated
            }
            None => {
                let row = user_lesson_progress::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    lesson_id: Set(lesson_id),
                    is_completed: Set(false),
                    watch_time_seconds: Set(seconds),
                    completion_date: Set(None),
                    updated_at: Set(Utc::now()),
                };
                row.insert(&txn).await?;
                seconds
            }
        };

        txn.commit().await?;

        Ok(WatchTimeResult {
            lesson_id,
            watch_time_seconds: total_seconds,
        })
    }

    /// Marks a lesson complete (idempotent) and recomputes the owning
    /// course's percentage. The course-progress tier is preserved when the
    /// row exists; otherwise it is taken from the user's completed purchase
    /// of the course, defaulting to basic with no purchase record.
    #[instrument(skip(self))]
    pub async fn complete_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<CompleteLessonResult, ServiceError> {
        let lesson = Lesson::find_by_id(lesson_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lesson not found".to_string()))?;

        let chapter = chapter::Entity::find_by_id(lesson.chapter_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Chapter not found".to_string()))?;
        let course_id = chapter.course_id;

        let txn = self.db.begin().await?;

        let existing = UserLessonProgress::find()
            .filter(user_lesson_progress::Column::UserId.eq(user_id))
            .filter(user_lesson_progress::Column::LessonId.eq(lesson_id))
            .one(&txn)
            .await?;

        match existing {
            Some(row) if row.is_completed => {
                // Completing twice is a no-op on lesson state.
            }
            Some(row) => {
                let mut row: user_lesson_progress::ActiveModel = row.into();
                row.is_completed = Set(true);
                row.completion_date = Set(Some(Utc::now()));
                row.updated_at = Set(Utc::now());
                row.update(&txn).await?;
            }
            None => {
                let row = user_lesson_progress::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    lesson_id: Set(lesson_id),
                    is_completed: Set(true),
                    watch_time_seconds: Set(0),
                    completion_date: Set(Some(Utc::now())),
                    updated_at: Set(Utc::now()),
                };
                row.insert(&txn).await?;
            }
        }

        let total_lessons = count_course_lessons(&txn, course_id).await?;
        let completed_lessons = count_completed_lessons(&txn, user_id, course_id).await?;
        let percentage = completion_percentage(completed_lessons, total_lessons);

        let progress_row = UserCourseProgress::find()
            .filter(user_course_progress::Column::UserId.eq(user_id))
            .filter(user_course_progress::Column::CourseId.eq(course_id))
            .one(&txn)
            .await?;

        let course_completed = percentage >= Decimal::from(100);
        match progress_row {
            Some(row) => {
                let status = if course_completed {
                    EnrollmentStatus::Completed
                } else {
                    row.status
                };
                let mut row: user_course_progress::ActiveModel = row.into();
                row.progress_percentage = Set(percentage);
                row.status = Set(status);
                row.updated_at = Set(Utc::now());
                row.update(&txn).await?;
            }
            None => {
                let tier = purchased_tier(&txn, user_id, course_id)
                    .await?
                    .unwrap_or(PricingTier::Basic);
                let now = Utc::now();
                let row = user_course_progress::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    course_id: Set(course_id),
                    progress_percentage: Set(percentage),
                    pricing_tier: Set(tier),
                    status: Set(if course_completed {
                        EnrollmentStatus::Completed
                    } else {
                        EnrollmentStatus::Enrolled
                    }),
                    enrolled_at: Set(now),
                    updated_at: Set(now),
                };
                row.insert(&txn).await?;
            }
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LessonCompleted { user_id, lesson_id })
            .await;
        if course_completed {
            self.event_sender
                .send_or_log(Event::CourseCompleted { user_id, course_id })
                .await;
        }

        info!(%user_id, %lesson_id, %course_id, %percentage, "lesson completed");
        Ok(CompleteLessonResult {
            course_id,
            progress_percentage: percentage,
            completed_lessons,
            total_lessons,
        })
    }

    /// Current rollup for a course: percentage plus completed lesson ids.
    #[instrument(skip(self))]
    pub async fn get_course_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<CourseProgress, ServiceError> {
        let progress = UserCourseProgress::find()
            .filter(user_course_progress::Column::UserId.eq(user_id))
            .filter(user_course_progress::Column::CourseId.eq(course_id))
            .one(&*self.db)
            .await?;

        let completed = UserLessonProgress::find()
            .filter(user_lesson_progress::Column::UserId.eq(user_id))
            .filter(user_lesson_progress::Column::IsCompleted.eq(true))
            .join(
                JoinType::InnerJoin,
                user_lesson_progress::Relation::Lesson.def(),
            )
            .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
            .filter(chapter::Column::CourseId.eq(course_id))
            .all(&*self.db)
            .await?;

        Ok(CourseProgress {
            progress_percentage: progress
                .map(|p| p.progress_percentage)
                .unwrap_or(Decimal::ZERO),
            completed_lessons: completed.into_iter().map(|row| row.lesson_id).collect(),
        })
    }
}

async fn count_course_lessons<C: ConnectionTrait>(
    conn: &C,
    course_id: Uuid,
) -> Result<u64, ServiceError> {
    let count = Lesson::find()
        .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
        .filter(chapter::Column::CourseId.eq(course_id))
        .count(conn)
        .await?;
    Ok(count)
}

async fn count_completed_lessons<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<u64, ServiceError> {
    let count = UserLessonProgress::find()
        .filter(user_lesson_progress::Column::UserId.eq(user_id))
        .filter(user_lesson_progress::Column::IsCompleted.eq(true))
        .join(
            JoinType::InnerJoin,
            user_lesson_progress::Relation::Lesson.def(),
        )
        .join(JoinType::InnerJoin, lesson::Relation::Chapter.def())
        .filter(chapter::Column::CourseId.eq(course_id))
        .count(conn)
        .await?;
    Ok(count)
}

/// Tier from the user's completed purchase of the course, if any.
async fn purchased_tier<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<PricingTier>, ServiceError> {
    let item = OrderItem::find()
        .filter(order_item::Column::CourseId.eq(course_id))
        .join(JoinType::InnerJoin, order_item::Relation::Order.def())
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::PaymentStatus.eq(PaymentStatus::Completed))
        .order_by_desc(order::Column::CreatedAt)
        .one(conn)
        .await?;
    Ok(item.map(|i| i.pricing_tier))
}

/// `completed / total * 100`, rounded to two decimal places. A course with
/// no lessons reports zero.
pub fn completion_percentage(completed: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(completed) * Decimal::from(100) / Decimal::from(total)).round_dp(2)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchTimeResult {
    pub lesson_id: Uuid,
    pub watch_time_seconds: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonResult {
    pub course_id: Uuid,
    pub progress_percentage: Decimal,
    pub completed_lessons: u64,
    pub total_lessons: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub progress_percentage: Decimal,
    pub completed_lessons: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn half_complete_course() {
        // spec example: 2 of 4 lessons done
        assert_eq!(completion_percentage(2, 4), dec!(50.00));
    }

    #[test]
    fn empty_course_is_zero() {
        assert_eq!(completion_percentage(0, 0), Decimal::ZERO);
    }

    #[test]
    fn full_completion_is_one_hundred() {
        assert_eq!(completion_percentage(3, 3), dec!(100.00));
    }

    #[test]
    fn thirds_round_to_cents() {
        assert_eq!(completion_percentage(1, 3), dec!(33.33));
        assert_eq!(completion_percentage(2, 3), dec!(66.67));
    }

    #[test]
    fn nothing_completed_is_zero() {
        assert_eq!(completion_percentage(0, 10), Decimal::ZERO);
    }
}
