mod qa;
mod reviews;

use axum::Router;

use crate::{
    ApiState,
    middleware::rate_limit::{WRITE_BURST, WRITE_PER_SECOND, with_rate_limit},
};

pub fn routes() -> Router<ApiState> {
    let engagement_routes = Router::new().merge(reviews::routes()).merge(qa::routes());
    with_rate_limit(engagement_routes, WRITE_PER_SECOND, WRITE_BURST)
}
