//! Public catalog and tutor authoring.

mod authoring;
mod routes;

use axum::Router;
use lms_db::models::{Course, User, UserRole};

use crate::ApiState;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .merge(routes::routes())
        .merge(authoring::routes())
}

/// Unlisted courses are only visible to their owner and admins.
pub(crate) fn can_view(course: &Course, viewer: Option<&User>) -> bool {
    course.is_listed()
        || viewer.is_some_and(|u| u.id == course.tutor_id || u.role == UserRole::OrgAdmin)
}
