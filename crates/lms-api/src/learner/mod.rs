//! The signed-in learner's own views: certificates, continue-learning,
//! statistics and profile.

mod certificates;
mod profile;
mod routes;

pub use routes::routes;
