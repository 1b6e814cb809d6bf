pub mod download;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod search;

pub use routes::create_router;
