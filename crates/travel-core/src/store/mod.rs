//! Storage collaborators used by the pipelines
//!
//! Missing rows surface as `PipelineError::NotFound` so that pipelines can
//! intercept them by kind.

use async_trait::async_trait;
use travel_db::{City, CommentWithPoster, Database, NewCity, NewComment, NewUser, UpdateCity, User};

use crate::error::PipelineError;
use crate::pipeline::PipelineItem;

#[cfg(test)]
pub(crate) mod memory;

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by username, failing with `NotFound` if absent
    async fn user_by_username(&self, username: &str) -> PipelineItem<User>;

    /// Persist a new user, returning its ID
    async fn insert_user(&self, user: &NewUser) -> PipelineItem<i64>;
}

/// City persistence
#[async_trait]
pub trait CityStore: Send + Sync {
    /// Fetch a city by case-insensitive name and country
    async fn city_by_natural_key(&self, name: &str, country: &str) -> PipelineItem<City>;

    async fn insert_city(&self, city: &NewCity) -> PipelineItem<i64>;

    /// Update a city, failing with `NotFound` if no row matched
    async fn update_city(&self, city: &UpdateCity) -> PipelineItem<()>;

    async fn city_by_id(&self, id: i64) -> PipelineItem<City>;

    async fn list_cities(&self) -> PipelineItem<Vec<City>>;

    /// Atomically delete a city and its dependent rows, returning the number
    /// of city rows removed
    async fn delete_city_cascade(&self, id: i64) -> PipelineItem<u64>;

    async fn latest_comments(&self, city_id: i64, limit: u32) -> PipelineItem<Vec<CommentWithPoster>>;

    async fn insert_comment(&self, comment: &NewComment) -> PipelineItem<i64>;
}

#[async_trait]
impl UserStore for Database {
    async fn user_by_username(&self, username: &str) -> PipelineItem<User> {
        self.get_user_by_username(username)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("username {} not found", username)))
    }

    async fn insert_user(&self, user: &NewUser) -> PipelineItem<i64> {
        Ok(Database::insert_user(self, user).await?)
    }
}

#[async_trait]
impl CityStore for Database {
    async fn city_by_natural_key(&self, name: &str, country: &str) -> PipelineItem<City> {
        self.get_city_by_name_and_country(name, country)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("city {} in {} not found", name, country)))
    }

    async fn insert_city(&self, city: &NewCity) -> PipelineItem<i64> {
        Ok(Database::insert_city(self, city).await?)
    }

    async fn update_city(&self, city: &UpdateCity) -> PipelineItem<()> {
        if Database::update_city(self, city).await? {
            Ok(())
        } else {
            Err(PipelineError::NotFound(format!("city {} not found", city.id)))
        }
    }

    async fn city_by_id(&self, id: i64) -> PipelineItem<City> {
        self.get_city(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("city {} not found", id)))
    }

    async fn list_cities(&self) -> PipelineItem<Vec<City>> {
        Ok(Database::list_cities(self).await?)
    }

    async fn delete_city_cascade(&self, id: i64) -> PipelineItem<u64> {
        Ok(Database::delete_city_cascade(self, id).await?)
    }

    async fn latest_comments(&self, city_id: i64, limit: u32) -> PipelineItem<Vec<CommentWithPoster>> {
        Ok(Database::latest_comments(self, city_id, limit).await?)
    }

    async fn insert_comment(&self, comment: &NewComment) -> PipelineItem<i64> {
        Ok(Database::insert_comment(self, comment).await?)
    }
}
