//! Database models

use crate::utils::{decode_salt, parse_datetime_or_now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Per-user random bytes; also the key that signs this user's tokens
    #[serde(skip_serializing)]
    pub salt: Vec<u8>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub salt: Vec<u8>,
    pub role: UserRole,
}

/// City model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// New city (for insertion)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCity {
    pub name: String,
    pub country: String,
}

/// City fields for an update by ID
#[derive(Debug, Clone)]
pub struct UpdateCity {
    pub id: i64,
    pub name: String,
    pub country: String,
}

/// Comment left on a city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub city_id: i64,
    pub poster_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Comment joined with the poster's username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithPoster {
    pub comment: Comment,
    pub poster_name: String,
}

/// New comment (for insertion)
#[derive(Debug, Clone)]
pub struct NewComment {
    pub city_id: i64,
    pub poster_id: i64,
    pub text: String,
}

/// Airport located in a city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: i64,
    pub city_id: i64,
    pub name: String,
    pub code: String,
}

/// New airport (for insertion)
#[derive(Debug, Clone)]
pub struct NewAirport {
    pub city_id: i64,
    pub name: String,
    pub code: String,
}

/// Flight route between two airports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub source_id: i64,
    pub destination_id: i64,
    pub price: f64,
}

/// New route (for insertion)
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub source_id: i64,
    pub destination_id: i64,
    pub price: f64,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            salt: decode_salt(&row.try_get::<String, _>("salt")?)?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::User),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for City {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(City {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            country: row.try_get("country")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CommentWithPoster {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CommentWithPoster {
            comment: Comment {
                id: row.try_get("id")?,
                city_id: row.try_get("city_id")?,
                poster_id: row.try_get("poster_id")?,
                text: row.try_get("text")?,
                created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
                modified_at: parse_datetime_or_now(&row.try_get::<String, _>("modified_at")?),
            },
            poster_name: row.try_get("poster_name")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Airport {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Airport {
            id: row.try_get("id")?,
            city_id: row.try_get("city_id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Route {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Route {
            id: row.try_get("id")?,
            source_id: row.try_get("source_id")?,
            destination_id: row.try_get("destination_id")?,
            price: row.try_get("price")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip_through_str() {
        assert_eq!(UserRole::from_str("USER").unwrap(), UserRole::User);
        assert_eq!(UserRole::from_str("ADMIN").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Admin.as_str(), "ADMIN");
        assert!(UserRole::from_str("ANY").is_err());
        assert!(UserRole::from_str("user").is_err());
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: "deadbeef".to_string(),
            salt: vec![1, 2, 3],
            role: UserRole::User,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "USER");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("salt").is_none());
    }
}
