pub mod admin;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod email;
pub mod engagement;
pub mod enrollment;
pub mod entitlement;
pub mod error;
pub mod gamification;
pub mod learner;
pub mod metrics;
pub mod middleware;
pub mod progress;
pub mod quiz;
pub mod router;
pub mod state;
pub mod tracing;
pub mod validation;
pub mod video;
pub mod webhooks;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig};
