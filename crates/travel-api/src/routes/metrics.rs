//! Prometheus scrape endpoint, served at the root outside the API prefix

use axum::{
    Router,
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Media type of the Prometheus text exposition format
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    Router::new().route("/metrics", get(scrape)).with_state(handle)
}

async fn scrape(State(handle): State<Arc<MetricsHandle>>) -> Response {
    ([(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render()).into_response()
}
