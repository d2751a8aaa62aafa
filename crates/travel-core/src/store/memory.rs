//! In-memory stores for service tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use travel_db::{
    City, Comment, CommentWithPoster, NewCity, NewComment, NewUser, UpdateCity, User, UserRole,
};

use super::{CityStore, UserStore};
use crate::error::PipelineError;
use crate::pipeline::PipelineItem;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    cities: Vec<City>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Natural-key probes never return while set
    pub stall_probes: AtomicBool,
    /// Comment lookups for this city fail with an infrastructure error
    pub failing_comments_city: Mutex<Option<i64>>,
    /// Cascade deletes fail with an infrastructure error while set
    pub failing_deletes: AtomicBool,
    pub city_inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, username: &str, role: UserRole) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.username == username) {
            user.role = role;
        }
    }

    pub fn city_count(&self) -> usize {
        self.tables.lock().unwrap().cities.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables.lock().unwrap().comments.len()
    }
}

fn same_key(city: &City, name: &str, country: &str) -> bool {
    city.name.eq_ignore_ascii_case(name) && city.country.eq_ignore_ascii_case(country)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_username(&self, username: &str) -> PipelineItem<User> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("username {} not found", username)))
    }

    async fn insert_user(&self, user: &NewUser) -> PipelineItem<i64> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(PipelineError::Conflict(user.username.clone()));
        }
        let id = tables.users.len() as i64 + 1;
        tables.users.push(User {
            id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            salt: user.salt.clone(),
            role: user.role,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[async_trait]
impl CityStore for MemoryStore {
    async fn city_by_natural_key(&self, name: &str, country: &str) -> PipelineItem<City> {
        if self.stall_probes.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        let tables = self.tables.lock().unwrap();
        tables
            .cities
            .iter()
            .find(|c| same_key(c, name, country))
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("city {} in {} not found", name, country)))
    }

    async fn insert_city(&self, city: &NewCity) -> PipelineItem<i64> {
        self.city_inserts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        if tables.cities.iter().any(|c| same_key(c, &city.name, &city.country)) {
            return Err(PipelineError::Conflict(format!("{}, {}", city.name, city.country)));
        }
        let id = tables.cities.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        tables.cities.push(City {
            id,
            name: city.name.clone(),
            country: city.country.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_city(&self, city: &UpdateCity) -> PipelineItem<()> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .cities
            .iter_mut()
            .find(|c| c.id == city.id)
            .ok_or_else(|| PipelineError::NotFound(format!("city {} not found", city.id)))?;
        row.name = city.name.clone();
        row.country = city.country.clone();
        Ok(())
    }

    async fn city_by_id(&self, id: i64) -> PipelineItem<City> {
        let tables = self.tables.lock().unwrap();
        tables
            .cities
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("city {} not found", id)))
    }

    async fn list_cities(&self) -> PipelineItem<Vec<City>> {
        let mut cities = self.tables.lock().unwrap().cities.clone();
        cities.sort_by_key(|c| c.id);
        Ok(cities)
    }

    async fn delete_city_cascade(&self, id: i64) -> PipelineItem<u64> {
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(PipelineError::infrastructure(
                "failed to delete city",
                std::io::Error::other("disk I/O error"),
            ));
        }
        let mut tables = self.tables.lock().unwrap();
        let before = tables.cities.len();
        tables.cities.retain(|c| c.id != id);
        if tables.cities.len() == before {
            return Err(PipelineError::NotFound(format!("City: {}", id)));
        }
        tables.comments.retain(|c| c.city_id != id);
        Ok(1)
    }

    async fn latest_comments(&self, city_id: i64, limit: u32) -> PipelineItem<Vec<CommentWithPoster>> {
        if *self.failing_comments_city.lock().unwrap() == Some(city_id) {
            return Err(PipelineError::infrastructure(
                "comment lookup failed",
                format!("city {}", city_id),
            ));
        }
        let tables = self.tables.lock().unwrap();
        let mut comments: Vec<_> = tables
            .comments
            .iter()
            .filter(|c| c.city_id == city_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.id.cmp(&a.id));
        comments.truncate(limit as usize);
        Ok(comments
            .into_iter()
            .map(|comment| {
                let poster_name = tables
                    .users
                    .iter()
                    .find(|u| u.id == comment.poster_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default();
                CommentWithPoster { comment, poster_name }
            })
            .collect())
    }

    async fn insert_comment(&self, comment: &NewComment) -> PipelineItem<i64> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.comments.len() as i64 + 1;
        let now = Utc::now();
        tables.comments.push(Comment {
            id,
            city_id: comment.city_id,
            poster_id: comment.poster_id,
            text: comment.text.clone(),
            created_at: now,
            modified_at: now,
        });
        Ok(id)
    }
}
