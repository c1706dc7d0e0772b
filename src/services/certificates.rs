use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{certificate, Certificate},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Issues and verifies course completion certificates.
#[derive(Clone)]
pub struct CertificateService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CertificateService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Issues a certificate for a passed certified course. Idempotent: an
    /// existing valid certificate for (user, course) is returned as-is.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<certificate::Model, ServiceError> {
        let existing = Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .filter(certificate::Column::CourseId.eq(course_id))
            .filter(certificate::Column::IsValid.eq(true))
            .one(&*self.db)
            .await?;
        if let Some(cert) = existing {
            return Ok(cert);
        }

        let id = Uuid::new_v4();
        let model = certificate::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            course_id: Set(course_id),
            certificate_number: Set(generate_certificate_number(id)),
            verification_code: Set(Uuid::new_v4().to_string()),
            issued_at: Set(Utc::now()),
            is_valid: Set(true),
        };
        let cert = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CertificateIssued(cert.id))
            .await;
        info!(certificate_number = %cert.certificate_number, %user_id, %course_id, "issued certificate");
        Ok(cert)
    }

    /// Checks that a certificate number exists and has not been revoked.
    pub async fn verify(&self, certificate_number: &str) -> Result<bool, ServiceError> {
        let found = Certificate::find()
            .filter(certificate::Column::CertificateNumber.eq(certificate_number))
            .filter(certificate::Column::IsValid.eq(true))
            .one(&*self.db)
            .await?;
        Ok(found.is_some())
    }
}

/// Time-derived certificate number with an id fragment for uniqueness.
fn generate_certificate_number(id: Uuid) -> String {
    let fragment = id.simple().to_string()[..8].to_uppercase();
    format!("CERT-{}-{}", Utc::now().format("%Y%m%d"), fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_number_shape() {
        let number = generate_certificate_number(Uuid::new_v4());
        assert!(number.starts_with("CERT-"));
        assert_eq!(number.len(), 5 + 8 + 1 + 8);
    }

    #[test]
    fn certificate_numbers_differ() {
        assert_ne!(
            generate_certificate_number(Uuid::new_v4()),
            generate_certificate_number(Uuid::new_v4())
        );
    }
}
