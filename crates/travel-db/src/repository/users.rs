//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User, UserRole};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user, returning its ID
    ///
    /// The unique index on `username` rejects a concurrent duplicate with
    /// `DbError::Duplicate`.
    pub async fn insert_user(&self, user: &NewUser) -> Result<i64, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, salt, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(hex::encode(&user.salt))
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_write(e, format!("User '{}' already exists", user.username)))?;

        Ok(result.get("id"))
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, username, password_hash, salt, role, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Update user role
    ///
    /// Roles are only ever changed out-of-band; token validation observes the
    /// stored value on every request.
    pub async fn update_user_role(&self, username: &str, role: UserRole) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE username = ?")
            .bind(role.as_str())
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{NewUser, UserRole};
    use crate::repository::test_support::temp_database;
    use crate::DbError;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "00ff".to_string(),
            salt: vec![7; 16],
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let (db, _dir) = temp_database().await;
        assert!(!db.has_users().await.unwrap());

        let id = db.insert_user(&new_user("alice")).await.unwrap();
        let user = db.get_user_by_username("alice").await.unwrap().unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.salt, vec![7; 16]);
        assert_eq!(user.role, UserRole::User);
        assert!(db.has_users().await.unwrap());
        assert!(db.get_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let (db, _dir) = temp_database().await;
        db.insert_user(&new_user("alice")).await.unwrap();

        let err = db.insert_user(&new_user("alice")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_user_role() {
        let (db, _dir) = temp_database().await;
        db.insert_user(&new_user("alice")).await.unwrap();

        assert!(db.update_user_role("alice", UserRole::Admin).await.unwrap());
        assert!(!db.update_user_role("nobody", UserRole::Admin).await.unwrap());

        let user = db.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.role, UserRole::Admin);
    }
}
