//! The one place a purchase row is created.
//!
//! Client verification, the payment webhook and free enrollment all funnel
//! into [`enroll`]. Exactly one purchase per (learner, course) survives any
//! mix of concurrent or repeated triggers: the table's unique constraints
//! decide the race and the loser reports `AlreadyEnrolled`.

use lms_db::{
    models::{Course, Purchase, User},
    repositories::purchase as purchase_repo,
};
use uuid::Uuid;

use super::paystack::{VerifiedPayment, check_verified_payment};
use crate::{
    ApiState,
    email::{Notification, notify},
    error::ApiError,
    metrics::record_enrollment,
};

/// Why the caller believes the learner should be enrolled
#[derive(Debug, Clone)]
pub enum Evidence {
    /// Result of a server-side transaction lookup
    Verified(VerifiedPayment),
    /// Signed `charge.success` notification from the gateway
    Webhook { reference: String, amount: i64 },
    /// Zero-price course
    Free,
}

impl Evidence {
    const fn path(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verify",
            Self::Webhook { .. } => "webhook",
            Self::Free => "free",
        }
    }
}

/// Result of a successful call to [`enroll`]
#[derive(Debug, Clone)]
pub enum EnrollmentOutcome {
    /// This call created the purchase
    Enrolled(Purchase),
    /// The learner already held the course; carries the surviving row
    AlreadyEnrolled(Option<Purchase>),
}

impl EnrollmentOutcome {
    /// The purchase backing the enrollment, when one could be read back
    pub fn purchase(&self) -> Option<&Purchase> {
        match self {
            Self::Enrolled(purchase) => Some(purchase),
            Self::AlreadyEnrolled(purchase) => purchase.as_ref(),
        }
    }

    pub const fn already_enrolled(&self) -> bool {
        matches!(self, Self::AlreadyEnrolled(_))
    }
}

/// Reference recorded for free enrollments; stable so replays collide.
pub fn free_reference(user_id: Uuid, course_id: Uuid) -> String {
    format!("free_{user_id}_{course_id}")
}

/// Check the evidence against the course and derive `(reference, amount)`.
fn admit(course: &Course, evidence: &Evidence, learner_id: Uuid) -> Result<(String, i64), ApiError> {
    let price = course.effective_price();
    match evidence {
        Evidence::Free if course.is_free() => Ok((free_reference(learner_id, course.id), 0)),
        Evidence::Free => Err(ApiError::Validation("This course is not free".to_string())),
        Evidence::Verified(payment) => {
            check_verified_payment(payment, price)?;
            Ok((payment.reference.clone(), payment.amount))
        }
        Evidence::Webhook { reference, amount } => {
            if *amount < price {
                return Err(ApiError::Validation(
                    "amount paid is less than the course price".to_string(),
                ));
            }
            Ok((reference.clone(), *amount))
        }
    }
}

/// Enroll `learner` in `course` on the strength of `evidence`.
///
/// A confirmation email is sent on a fresh enrollment, detached from the
/// request; its failure never undoes the purchase.
pub async fn enroll(
    state: &ApiState,
    learner: &User,
    course: &Course,
    evidence: Evidence,
) -> Result<EnrollmentOutcome, ApiError> {
    let path = evidence.path();

    let (reference, amount) = admit(course, &evidence, learner.id).inspect_err(|e| {
        tracing::info!(learner_id = %learner.id, course_id = %course.id, path, reason = %e, "enrollment rejected");
        record_enrollment(path, "rejected");
    })?;

    if let Some(existing) =
        purchase_repo::find_for_user_course(&state.pool, learner.id, course.id).await?
    {
        record_enrollment(path, "already_enrolled");
        return Ok(EnrollmentOutcome::AlreadyEnrolled(Some(existing)));
    }

    let inserted =
        purchase_repo::insert_if_absent(&state.pool, learner.id, course.id, amount, &reference)
            .await?;

    match inserted {
        Some(purchase) => {
            tracing::info!(
                purchase_id = %purchase.id,
                learner_id = %learner.id,
                course_id = %course.id,
                amount,
                path,
                "learner enrolled"
            );
            record_enrollment(path, "enrolled");
            notify(
                state.email_service.as_ref(),
                &learner.email,
                Notification::EnrollmentConfirmed {
                    course_title: course.title.clone(),
                },
            );
            Ok(EnrollmentOutcome::Enrolled(purchase))
        }
        None => {
            // Lost a race against another trigger, or the reference was
            // already used for a different enrollment.
            let existing =
                purchase_repo::find_for_user_course(&state.pool, learner.id, course.id).await?;
            if existing.is_none() {
                tracing::warn!(%reference, learner_id = %learner.id, course_id = %course.id, "payment reference already used by another enrollment");
                record_enrollment(path, "rejected");
                return Err(ApiError::Validation(
                    "payment reference already used".to_string(),
                ));
            }
            record_enrollment(path, "already_enrolled");
            Ok(EnrollmentOutcome::AlreadyEnrolled(existing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lms_db::models::ApprovalStatus;

    fn course(price: Option<i64>) -> Course {
        Course {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            title: "Intro".to_string(),
            description: None,
            price,
            image_url: None,
            is_published: true,
            approval_status: ApprovalStatus::Approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_free_admission_uses_stable_reference() {
        let learner = Uuid::new_v4();
        let c = course(None);

        let (reference, amount) = admit(&c, &Evidence::Free, learner).unwrap();
        assert_eq!(amount, 0);
        assert_eq!(reference, free_reference(learner, c.id));
        assert_eq!(admit(&course(Some(0)), &Evidence::Free, learner).unwrap().1, 0);
    }

    #[test]
    fn test_free_evidence_rejected_for_paid_course() {
        let result = admit(&course(Some(1000)), &Evidence::Free, Uuid::new_v4());
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_webhook_amount_shortfall_rejected() {
        let evidence = Evidence::Webhook {
            reference: "pay_abc123".to_string(),
            amount: 999,
        };
        let result = admit(&course(Some(1000)), &evidence, Uuid::new_v4());
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_verified_payment_admitted_with_paid_amount() {
        let evidence = Evidence::Verified(VerifiedPayment {
            reference: "pay_abc123".to_string(),
            status: "success".to_string(),
            amount: 1500,
            currency: None,
        });
        let (reference, amount) = admit(&course(Some(1000)), &evidence, Uuid::new_v4()).unwrap();
        assert_eq!(reference, "pay_abc123");
        assert_eq!(amount, 1500);
    }
}
