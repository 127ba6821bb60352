//! Lesson access checks backed by purchases.

use lms_db::{
    models::{LessonContext, User, UserRole},
    repositories::purchase as purchase_repo,
};
use lms_engine::entitlement::{self, AccessDecision, Gate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// Whether `user` holds the course: a successful purchase, ownership of the
/// course, or the org admin role.
pub async fn is_entitled(
    pool: &PgPool,
    user: &User,
    course_id: Uuid,
    tutor_id: Uuid,
) -> Result<bool, ApiError> {
    if user.id == tutor_id || user.role == UserRole::OrgAdmin {
        return Ok(true);
    }
    Ok(purchase_repo::has_successful_purchase(pool, user.id, course_id).await?)
}

/// Decide whether `learner` (or an anonymous caller) may open `lesson`.
///
/// Always reads live purchase state.
pub async fn can_access_lesson(
    pool: &PgPool,
    learner: Option<&User>,
    lesson: &LessonContext,
) -> Result<AccessDecision, ApiError> {
    let gate = entitlement::gate(lesson.is_free_preview, learner.map(|u| u.id));

    let entitled = match (gate, learner) {
        (Gate::RequiresPurchase(_), Some(user)) => {
            is_entitled(pool, user, lesson.course_id, lesson.tutor_id).await?
        }
        _ => false,
    };

    Ok(entitlement::resolve(gate, entitled))
}

/// Map a denied decision onto the HTTP taxonomy.
pub fn require_access(decision: AccessDecision) -> Result<(), ApiError> {
    match decision {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Unauthenticated => Err(ApiError::Unauthenticated(
            "Sign in to access this lesson".to_string(),
        )),
        AccessDecision::NotEnrolled => Err(ApiError::Forbidden("not enrolled".to_string())),
    }
}

/// Convenience wrapper: decide and reject in one step.
pub async fn ensure_lesson_access(
    pool: &PgPool,
    learner: Option<&User>,
    lesson: &LessonContext,
) -> Result<(), ApiError> {
    require_access(can_access_lesson(pool, learner, lesson).await?)
}
