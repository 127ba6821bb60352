pub mod paystack;
mod routes;
pub mod service;

pub use routes::routes;
pub use service::{EnrollmentOutcome, Evidence, enroll};
