//! Travel Catalog REST API
//!
//! This crate provides the Axum-based HTTP API for the travel catalog:
//! login and signup, city management and comments.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{API_PREFIX, create_router};
pub use state::{AppState, MetricsHandle};
