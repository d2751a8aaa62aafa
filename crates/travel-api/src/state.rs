//! Application state

use std::sync::Arc;
use travel_core::{AuthService, CityService, CityServiceConfig};
use travel_db::Database;

/// Prometheus recorder handle rendered by the metrics endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub cities: Arc<CityService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, cities: Arc<CityService>) -> Self {
        Self { auth, cities }
    }

    /// Build both services on top of one database
    pub fn from_database(db: Database, config: CityServiceConfig) -> Self {
        let db = Arc::new(db);
        Self::new(
            Arc::new(AuthService::new(db.clone())),
            Arc::new(CityService::with_config(db, config)),
        )
    }
}
