//! Authentication pipelines: login, signup and token validation

use std::sync::Arc;
use travel_auth::{
    AuthError, RequiredRole, TokenCodec, generate_salt, hash_password, verify_password,
};
use travel_db::{NewUser, User, UserRole};

use crate::error::{ErrorKind, PipelineError};
use crate::log_context::LogContext;
use crate::pipeline::{Pipeline, PipelineItem};
use crate::store::UserStore;

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_codec(store, TokenCodec::default())
    }

    pub fn with_codec(store: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Check a username and password and issue a token for the user
    pub async fn login(&self, ctx: &LogContext, username: &str, password: &str) -> PipelineItem<String> {
        let ctx = ctx
            .with("function", "AuthService::login")
            .with("username", username);
        let store = self.store.as_ref();
        let codec = &self.codec;

        let result = Pipeline::just(username.to_string())
            .map(move |username| async move { store.user_by_username(&username).await })
            .map_sync(move |user| {
                if verify_password(password, &user.password_hash, &user.salt) {
                    Ok(user)
                } else {
                    Err(AuthError::InvalidCredentials.into())
                }
            })
            .map_sync(move |user| {
                codec
                    .issue(&user)
                    .map_err(|e| PipelineError::infrastructure("failed to sign token", e))
            })
            .await;

        match &result {
            Ok(_) => {
                metrics::counter!("travel_logins_total", "outcome" => "success").increment(1);
                ctx.info("Login succeeded");
            }
            Err(err) => {
                metrics::counter!("travel_logins_total", "outcome" => err.kind().as_str()).increment(1);
                ctx.with_error(err).warn("Login failed");
            }
        }
        result
    }

    /// Register a new user with the USER role, returning its ID
    ///
    /// Fails with `Conflict` if the username is taken.
    pub async fn save_user(&self, ctx: &LogContext, username: &str, password: &str) -> PipelineItem<i64> {
        let ctx = ctx
            .with("function", "AuthService::save_user")
            .with("username", username);
        let store = self.store.as_ref();
        let name = username.to_string();

        let result = Pipeline::just(username.to_string())
            .map(move |username| async move { store.user_by_username(&username).await })
            .map_sync(|existing| {
                Err::<(), _>(PipelineError::Conflict(format!(
                    "username {} is taken",
                    existing.username
                )))
            })
            .intercept(ErrorKind::NotFound, |_| ())
            .map_sync(move |()| {
                let salt = generate_salt();
                Ok(NewUser {
                    username: name,
                    password_hash: hash_password(password, &salt),
                    salt: salt.to_vec(),
                    role: UserRole::User,
                })
            })
            .map(move |user| async move { store.insert_user(&user).await })
            .await;

        match &result {
            Ok(id) => {
                metrics::counter!("travel_signups_total", "outcome" => "success").increment(1);
                ctx.with("user_id", id).info("User registered");
            }
            Err(err) => {
                metrics::counter!("travel_signups_total", "outcome" => err.kind().as_str()).increment(1);
                ctx.with_error(err).warn("Signup failed");
            }
        }
        result
    }

    /// Verify a token and return the stored user it was issued to
    ///
    /// The token's subject selects the user whose salt checks the signature,
    /// then `required` is checked against both the claimed and the stored role.
    pub async fn authenticate(
        &self,
        ctx: &LogContext,
        token: &str,
        required: RequiredRole,
    ) -> PipelineItem<User> {
        let ctx = ctx.with("function", "AuthService::authenticate");
        let store = self.store.as_ref();
        let codec = &self.codec;

        let result = Pipeline::just(token.to_string())
            .map_sync(move |token| {
                let subject = codec.peek_subject(&token)?;
                Ok((token, subject))
            })
            .map(move |(token, subject)| async move {
                let user = store.user_by_username(&subject).await.map_err(|err| {
                    if err.is(ErrorKind::NotFound) {
                        PipelineError::Invalid(format!("unknown token subject {}", subject))
                    } else {
                        err
                    }
                })?;
                Ok((token, user))
            })
            .map_sync(move |(token, user)| {
                let claims = codec.verify(&token, &user.salt)?;
                if !required.permits(claims.role, user.role) {
                    return Err(AuthError::IncorrectRole.into());
                }
                Ok(user)
            })
            .await;

        if let Err(err) = &result {
            ctx.with_error(err).warn("Token rejected");
        }
        result
    }

    /// Verify a token and return its subject's username
    pub async fn validate_jwt(
        &self,
        ctx: &LogContext,
        token: &str,
        required: RequiredRole,
    ) -> PipelineItem<String> {
        self.authenticate(ctx, token, required)
            .await
            .map(|user| user.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_signup_then_login_issues_user_token() {
        let (auth, _) = service();
        let ctx = LogContext::new();

        auth.save_user(&ctx, "alice", "pw1").await.unwrap();
        let token = auth.login(&ctx, "alice", "pw1").await.unwrap();

        let user = auth
            .authenticate(&ctx, &token, RequiredRole::Exactly(UserRole::User))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(TokenCodec::default().peek_subject(&token).unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid() {
        let (auth, _) = service();
        let ctx = LogContext::new();
        auth.save_user(&ctx, "alice", "pw1").await.unwrap();

        let err = auth.login(&ctx, "alice", "nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(err.to_string().contains("wrong password"));
    }

    #[tokio::test]
    async fn test_unknown_user_login_is_not_found() {
        let (auth, _) = service();

        let err = auth.login(&LogContext::new(), "ghost", "pw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let (auth, _) = service();
        let ctx = LogContext::new();

        let first = auth.save_user(&ctx, "bob", "pw").await.unwrap();
        let err = auth.save_user(&ctx, "bob", "other").await.unwrap_err();

        assert_eq!(first, 1);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        // The first password still works
        auth.login(&ctx, "bob", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_role_change_invalidates_token() {
        let (auth, store) = service();
        let ctx = LogContext::new();
        auth.save_user(&ctx, "carol", "pw").await.unwrap();
        let token = auth.login(&ctx, "carol", "pw").await.unwrap();

        store.set_role("carol", UserRole::Admin);

        let err = auth
            .validate_jwt(&ctx, &token, RequiredRole::Exactly(UserRole::User))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        // Claimed USER never satisfies an ADMIN requirement either
        let err = auth
            .validate_jwt(&ctx, &token, RequiredRole::Exactly(UserRole::Admin))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Incorrect role"));

        let name = auth.validate_jwt(&ctx, &token, RequiredRole::Any).await.unwrap();
        assert_eq!(name, "carol");
    }

    #[tokio::test]
    async fn test_garbage_and_expired_tokens_are_invalid() {
        let store = Arc::new(MemoryStore::new());
        let ctx = LogContext::new();
        let expired = AuthService::with_codec(store.clone(), TokenCodec::with_lifetime(Duration::seconds(-10)));
        let auth = AuthService::new(store);

        auth.save_user(&ctx, "dave", "pw").await.unwrap();
        let stale = expired.login(&ctx, "dave", "pw").await.unwrap();

        let err = auth.validate_jwt(&ctx, &stale, RequiredRole::Any).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = auth.validate_jwt(&ctx, "not-a-token", RequiredRole::Any).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_token_for_unknown_subject_is_invalid() {
        let (auth, _) = service();
        let other_store = Arc::new(MemoryStore::new());
        let other = AuthService::new(other_store);
        let ctx = LogContext::new();

        other.save_user(&ctx, "erin", "pw").await.unwrap();
        let token = other.login(&ctx, "erin", "pw").await.unwrap();

        let err = auth.validate_jwt(&ctx, &token, RequiredRole::Any).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
}
