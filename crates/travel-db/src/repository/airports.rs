//! Airport and route operations

use sqlx::Row;

use crate::error::DbError;
use crate::models::{Airport, NewAirport, NewRoute, Route};
use crate::repository::Database;

impl Database {
    // ==================== Airport Operations ====================

    /// Insert a new airport, returning its ID
    pub async fn insert_airport(&self, airport: &NewAirport) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO airports (city_id, name, code) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(airport.city_id)
        .bind(&airport.name)
        .bind(&airport.code)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.get("id"))
    }

    /// List airports located in a city
    pub async fn airports_for_city(&self, city_id: i64) -> Result<Vec<Airport>, DbError> {
        let rows = sqlx::query("SELECT id, city_id, name, code FROM airports WHERE city_id = ? ORDER BY id")
            .bind(city_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Airport::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Route Operations ====================

    /// Insert a new route, returning its ID
    pub async fn insert_route(&self, route: &NewRoute) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO routes (source_id, destination_id, price) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(route.source_id)
        .bind(route.destination_id)
        .bind(route.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.get("id"))
    }

    /// List routes departing from or arriving at any airport of a city
    pub async fn routes_for_city(&self, city_id: i64) -> Result<Vec<Route>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_id, destination_id, price
            FROM routes
            WHERE source_id IN (SELECT id FROM airports WHERE city_id = ?)
               OR destination_id IN (SELECT id FROM airports WHERE city_id = ?)
            ORDER BY id
            "#,
        )
        .bind(city_id)
        .bind(city_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Route::try_from(row).map_err(DbError::from))
            .collect()
    }
}
