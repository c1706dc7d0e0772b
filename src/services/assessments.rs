use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{chapter, course, quiz, quiz_attempt, Quiz, QuizAttempt},
    errors::ServiceError,
    events::{Event, EventSender},
    services::certificates::CertificateService,
};

/// Quiz attempts and grading. A passed quiz on a certified course triggers
/// certificate issuance.
#[derive(Clone)]
pub struct AssessmentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    certificates: Arc<CertificateService>,
}

impl AssessmentService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        certificates: Arc<CertificateService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            certificates,
        }
    }

    /// Opens a new attempt, rejecting once `attempts_allowed` is reached.
    #[instrument(skip(self))]
    pub async fn start_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<AttemptStarted, ServiceError> {
        let quiz = Quiz::find_by_id(quiz_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quiz not found".to_string()))?;

        let previous_attempts = QuizAttempt::find()
            .filter(quiz_attempt::Column::UserId.eq(user_id))
            .filter(quiz_attempt::Column::QuizId.eq(quiz_id))
            .count(&*self.db)
            .await?;

        let attempt_number = previous_attempts as i32 + 1;
        if attempt_number > quiz.attempts_allowed {
            return Err(ServiceError::ValidationError(
                "Maximum attempts reached".to_string(),
            ));
        }

        let attempt = quiz_attempt::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            quiz_id: Set(quiz_id),
            attempt_number: Set(attempt_number),
            score: Set(None),
            answers: Set(None),
            started_at: Set(Utc::now()),
            completed_at: Set(None),
            time_taken_minutes: Set(None),
            is_passed: Set(None),
        };
        let attempt = attempt.insert(&*self.db).await?;

        Ok(AttemptStarted {
            attempt_id: attempt.id,
            attempt_number,
            time_limit_minutes: quiz.time_limit_minutes,
        })
    }

    /// Grades a submission against the stored question set and records the
    /// outcome. Passing a quiz on a certified course issues a certificate.
    #[instrument(skip(self, answers))]
    pub async fn submit_attempt(
        &self,
        user_id: Uuid,
        attempt_id: Uuid,
        answers: Vec<AnswerInput>,
    ) -> Result<AttemptResult, ServiceError> {
        let attempt = QuizAttempt::find_by_id(attempt_id)
            .filter(quiz_attempt::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Attempt not found".to_string()))?;

        if attempt.completed_at.is_some() {
            return Err(ServiceError::ValidationError(
                "Attempt already submitted".to_string(),
            ));
        }

        let quiz = Quiz::find_by_id(attempt.quiz_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quiz not found".to_string()))?;

        let questions: Vec<QuizQuestion> = serde_json::from_value(quiz.questions.clone())
            .map_err(|e| ServiceError::InternalError(format!("Malformed question set: {e}")))?;

        let score = score_answers(&questions, &answers);
        let is_passed = score >= quiz.passing_score;
        let time_taken = (Utc::now() - attempt.started_at).num_minutes().max(0) as i32;
        let quiz_id = attempt.quiz_id;

        let mut active: quiz_attempt::ActiveModel = attempt.into();
        active.score = Set(Some(score));
        active.answers = Set(Some(serde_json::to_value(&answers).map_err(|e| {
            ServiceError::InternalError(format!("Answer serialization failed: {e}"))
        })?));
        active.completed_at = Set(Some(Utc::now()));
        active.time_taken_minutes = Set(Some(time_taken));
        active.is_passed = Set(Some(is_passed));
        active.update(&*self.db).await?;

        let mut certificate_id = None;
        if is_passed {
            if let Some(course) = self.course_for_quiz(&quiz).await? {
                if course.is_certified {
                    let cert = self.certificates.issue(user_id, course.id).await?;
                    certificate_id = Some(cert.id);
                }
            }
        }

        self.event_sender
            .send_or_log(Event::QuizSubmitted {
                user_id,
                quiz_id,
                passed: is_passed,
            })
            .await;

        info!(%user_id, %quiz_id, %score, is_passed, "quiz attempt graded");
        Ok(AttemptResult {
            score,
            is_passed,
            certificate_id,
        })
    }

    async fn course_for_quiz(
        &self,
        quiz: &quiz::Model,
    ) -> Result<Option<course::Model>, ServiceError> {
        let chapter = chapter::Entity::find_by_id(quiz.chapter_id)
            .one(&*self.db)
            .await?;
        match chapter {
            Some(ch) => Ok(course::Entity::find_by_id(ch.course_id)
                .one(&*self.db)
                .await?),
            None => Ok(None),
        }
    }
}

/// Stored quiz question. Only `id` and `correct_answer_id` participate in
/// grading; the rest is presentation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
    pub correct_answer_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: i64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: i64,
    pub answer_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStarted {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub time_limit_minutes: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub score: Decimal,
    pub is_passed: bool,
    pub certificate_id: Option<Uuid>,
}

/// `correct / total * 100`, rounded to two decimals. Unanswered or unknown
/// questions count as wrong; an empty question set scores zero.
pub fn score_answers(questions: &[QuizQuestion], answers: &[AnswerInput]) -> Decimal {
    if questions.is_empty() {
        return Decimal::ZERO;
    }

    let correct = questions
        .iter()
        .filter(|q| {
            answers
                .iter()
                .find(|a| a.question_id == q.id)
                .is_some_and(|a| a.answer_id == q.correct_answer_id)
        })
        .count();

    (Decimal::from(correct) * Decimal::from(100) / Decimal::from(questions.len()))
        .round_dp(2)
}
