//! Travel Catalog Authentication
//!
//! This crate provides salted password hashing and JWT issuance and
//! verification. Tokens are signed with the owning user's salt, so there is
//! no process-wide signing secret.

pub mod error;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, RequiredRole, TOKEN_LIFETIME_SECS, TokenCodec};
pub use password::{SALT_LEN, generate_salt, hash_password, verify_password};
