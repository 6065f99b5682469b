pub mod error;
pub mod routes;

pub use routes::build_router;
