//! HTTP query surface: health, status and streamed answers

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::serve_api;
