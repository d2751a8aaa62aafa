//! Travel Catalog Core
//!
//! This crate holds the request pipelines: the staged pipeline engine, the
//! authentication flows and the city catalog built on top of it.

pub mod auth;
pub mod cities;
pub mod error;
pub mod log_context;
pub mod pipeline;
pub mod resource;
pub mod store;

pub use auth::AuthService;
pub use cities::{CityService, CityServiceConfig, CityWithComments};
pub use error::{ErrorKind, PipelineError};
pub use log_context::LogContext;
pub use pipeline::{Pipeline, PipelineItem};
pub use resource::{NaturalKeyResource, create_if_absent};
pub use store::{CityStore, UserStore};
