//! Org admin moderation and curation, plus the public learning-path listing.

mod learning_paths;
mod moderation;

use axum::Router;

use crate::ApiState;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .merge(moderation::routes())
        .merge(learning_paths::routes())
}
