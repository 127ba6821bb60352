pub mod mux;
mod routes;

pub use routes::routes;
