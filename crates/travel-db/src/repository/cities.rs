//! City operations

use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::{City, NewCity, UpdateCity};
use crate::repository::Database;

impl Database {
    // ==================== City Operations ====================

    /// Find a city by its natural key (case-insensitive name and country)
    pub async fn get_city_by_name_and_country(
        &self,
        name: &str,
        country: &str,
    ) -> Result<Option<City>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, country, created_at
            FROM cities
            WHERE LOWER(name) = LOWER(?) AND LOWER(country) = LOWER(?)
            "#,
        )
        .bind(name)
        .bind(country)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| City::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Insert a new city, returning its ID
    pub async fn insert_city(&self, city: &NewCity) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO cities (name, country, created_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&city.name)
        .bind(&city.country)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::on_write(
                e,
                format!("City '{}' in '{}' already exists", city.name, city.country),
            )
        })?;

        Ok(result.get("id"))
    }

    /// Update a city's name and country
    pub async fn update_city(&self, city: &UpdateCity) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE cities SET name = ?, country = ? WHERE id = ?")
            .bind(&city.name)
            .bind(&city.country)
            .bind(city.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::on_write(
                    e,
                    format!("City '{}' in '{}' already exists", city.name, city.country),
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Get a city by ID
    pub async fn get_city(&self, id: i64) -> Result<Option<City>, DbError> {
        let result = sqlx::query("SELECT id, name, country, created_at FROM cities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| City::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all cities
    pub async fn list_cities(&self) -> Result<Vec<City>, DbError> {
        let rows = sqlx::query("SELECT id, name, country, created_at FROM cities ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| City::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Delete a city together with every row that depends on it
    ///
    /// Routes touching the city's airports go first, then airports, comments,
    /// and finally the city row. All statements share one transaction; an
    /// error or a missing city drops it uncommitted, which rolls back.
    pub async fn delete_city_cascade(&self, id: i64) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        let routes = sqlx::query(
            r#"
            DELETE FROM routes
            WHERE source_id IN (SELECT id FROM airports WHERE city_id = ?)
               OR destination_id IN (SELECT id FROM airports WHERE city_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let airports = sqlx::query("DELETE FROM airports WHERE city_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let comments = sqlx::query("DELETE FROM comments WHERE city_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let cities = sqlx::query("DELETE FROM cities WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let count = cities.rows_affected();
        if count == 0 {
            tx.rollback().await?;
            return Err(DbError::NotFound(format!("City: {}", id)));
        }

        tx.commit().await?;

        debug!(
            "Deleted city {} ({} routes, {} airports, {} comments)",
            id,
            routes.rows_affected(),
            airports.rows_affected(),
            comments.rows_affected()
        );
        Ok(count)
    }
}
