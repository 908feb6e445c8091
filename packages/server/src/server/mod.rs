// HTTP server setup (Axum + JSON API)
pub mod app;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;

pub use app::*;
