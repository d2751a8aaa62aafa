//! API routes

pub mod auth;
mod cities;
mod health;
pub mod metrics;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Prefix shared by every catalog route
pub const API_PREFIX: &str = "/gotravel/v1";

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let api = Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(cities::routes())
        .with_state(state);

    let mut router = Router::new().nest(API_PREFIX, api);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
