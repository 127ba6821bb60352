use axum::{
    Router,
    routing::{get, post},
};

use super::{certificates, profile};
use crate::ApiState;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/me", get(profile::get_me).patch(profile::update_me))
        .route("/me/tutor-application", post(profile::apply_as_tutor))
        .route("/me/certificates", get(certificates::list_certificates))
        .route("/me/certificates/{course_id}", get(certificates::get_certificate))
        .route("/me/continue-learning", get(certificates::continue_learning))
        .route("/me/stats", get(profile::get_stats))
}
