//! City catalog service

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use travel_db::{City, CommentWithPoster, NewCity, NewComment, UpdateCity};

use crate::error::{ErrorKind, PipelineError};
use crate::log_context::LogContext;
use crate::pipeline::{Pipeline, PipelineItem};
use crate::resource::{NaturalKeyResource, create_if_absent};
use crate::store::CityStore;

/// Default time allowed for the existence probe when creating a city
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(5);

/// Default number of cities whose comments are fetched at once
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct CityServiceConfig {
    pub probe_deadline: Duration,
    pub fan_out_concurrency: usize,
}

impl Default for CityServiceConfig {
    fn default() -> Self {
        Self {
            probe_deadline: DEFAULT_PROBE_DEADLINE,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }
}

/// A city with its most recent comments
#[derive(Debug, Clone, Serialize)]
pub struct CityWithComments {
    #[serde(flatten)]
    pub city: City,
    pub comments: Vec<CommentWithPoster>,
}

pub struct CityService {
    store: Arc<dyn CityStore>,
    config: CityServiceConfig,
}

#[async_trait]
impl NaturalKeyResource for CityService {
    type Candidate = NewCity;
    type Existing = City;

    fn describe(candidate: &NewCity) -> String {
        format!("city {} in {}", candidate.name, candidate.country)
    }

    async fn probe(&self, candidate: &NewCity) -> PipelineItem<City> {
        self.store
            .city_by_natural_key(&candidate.name, &candidate.country)
            .await
    }

    async fn insert(&self, candidate: &NewCity) -> PipelineItem<i64> {
        self.store.insert_city(candidate).await
    }
}

fn required(field: &str, value: &str) -> PipelineItem<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

async fn attach_comments(
    store: &dyn CityStore,
    city: City,
    limit: u32,
) -> PipelineItem<CityWithComments> {
    let comments = if limit == 0 {
        Vec::new()
    } else {
        store.latest_comments(city.id, limit).await?
    };
    Ok(CityWithComments { city, comments })
}

impl CityService {
    pub fn new(store: Arc<dyn CityStore>) -> Self {
        Self::with_config(store, CityServiceConfig::default())
    }

    pub fn with_config(store: Arc<dyn CityStore>, config: CityServiceConfig) -> Self {
        Self { store, config }
    }

    /// Create a city unless one with the same name and country exists
    pub async fn create_city(&self, ctx: &LogContext, name: &str, country: &str) -> PipelineItem<i64> {
        let ctx = ctx
            .with("function", "CityService::create_city")
            .with("name", name)
            .with("country", country);

        let candidate = required("name", name).and_then(|name| {
            Ok(NewCity {
                name,
                country: required("country", country)?,
            })
        });
        let result = match candidate {
            Ok(candidate) => create_if_absent(self, candidate, self.config.probe_deadline).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(id) => {
                metrics::counter!("travel_cities_created_total").increment(1);
                ctx.with("city_id", id).info("City created");
            }
            Err(err) => ctx.with_error(err).warn("City not created"),
        }
        result
    }

    /// Replace a city's name and country
    pub async fn update_city(&self, ctx: &LogContext, id: i64, name: &str, country: &str) -> PipelineItem<()> {
        let ctx = ctx
            .with("function", "CityService::update_city")
            .with("city_id", id);
        let store = self.store.as_ref();

        let result = Pipeline::from_item(required("name", name))
            .map_sync(move |name| {
                Ok(UpdateCity {
                    id,
                    name,
                    country: required("country", country)?,
                })
            })
            .map(move |city| async move { store.update_city(&city).await })
            .await;

        match &result {
            Ok(()) => ctx.info("City updated"),
            Err(err) => ctx.with_error(err).warn("City not updated"),
        }
        result
    }

    /// Delete a city together with its airports, routes and comments
    pub async fn delete_city(&self, ctx: &LogContext, id: i64) -> PipelineItem<()> {
        let ctx = ctx
            .with("function", "CityService::delete_city")
            .with("city_id", id);

        let store = self.store.as_ref();

        let result = Pipeline::just(id)
            .map(move |id| async move { store.delete_city_cascade(id).await.map(|_| ()) })
            .await;

        match &result {
            Ok(()) => ctx.info("City deleted"),
            Err(err) if err.is(ErrorKind::Infrastructure) => ctx.with_error(err).error("City delete failed"),
            Err(err) => ctx.with_error(err).warn("City not deleted"),
        }
        result
    }

    /// Fetch a city with up to `comments` of its most recent comments
    pub async fn get_city(&self, ctx: &LogContext, id: i64, comments: u32) -> PipelineItem<CityWithComments> {
        let store = self.store.as_ref();

        let result = Pipeline::just(id)
            .map(move |id| async move { store.city_by_id(id).await })
            .map(move |city| attach_comments(store, city, comments))
            .await;

        if let Err(err) = &result {
            ctx.with("function", "CityService::get_city")
                .with("city_id", id)
                .with_error(err)
                .warn("City lookup failed");
        }
        result
    }

    /// List every city ordered by ID, each with up to `comments` recent comments
    ///
    /// Comments are fetched for several cities at once; any failed fetch fails
    /// the whole listing.
    pub async fn list_cities(&self, ctx: &LogContext, comments: u32) -> PipelineItem<Vec<CityWithComments>> {
        let store = self.store.as_ref();

        let result = Pipeline::just(())
            .map(move |()| async move { store.list_cities().await })
            .fan_out(self.config.fan_out_concurrency, move |city| {
                attach_comments(store, city, comments)
            })
            .map_sync(|mut cities| {
                cities.sort_by_key(|c| c.city.id);
                Ok(cities)
            })
            .await;

        if let Err(err) = &result {
            ctx.with("function", "CityService::list_cities")
                .with_error(err)
                .warn("City listing failed");
        }
        result
    }

    /// Post a comment on an existing city
    pub async fn add_comment(
        &self,
        ctx: &LogContext,
        city_id: i64,
        poster_id: i64,
        text: &str,
    ) -> PipelineItem<i64> {
        let ctx = ctx
            .with("function", "CityService::add_comment")
            .with("city_id", city_id)
            .with("poster_id", poster_id);
        let store = self.store.as_ref();

        let result = Pipeline::from_item(required("text", text))
            .map(move |text| async move {
                store.city_by_id(city_id).await?;
                Ok(NewComment {
                    city_id,
                    poster_id,
                    text,
                })
            })
            .map(move |comment| async move { store.insert_comment(&comment).await })
            .await;

        match &result {
            Ok(id) => ctx.with("comment_id", id).info("Comment added"),
            Err(err) => ctx.with_error(err).warn("Comment not added"),
        }
        result
    }
}
