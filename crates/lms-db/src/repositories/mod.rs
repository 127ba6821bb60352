// All repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).

pub mod analytics;
pub mod catalog;
pub mod engagement;
pub mod gamification;
pub mod learning_path;
pub mod progress;
pub mod purchase;
pub mod quiz;
pub mod user;
pub mod video;
