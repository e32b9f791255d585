//! User service
//!
//! Account registration and the session lifecycle:
//! - Register (username uniqueness is checked here, the form checks the rest)
//! - Login / logout
//! - Resolving a session token back to its user

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::forms::FormErrors;
use crate::models::{CreateUserInput, Session, User};
use crate::services::password::{hash_password, spend_dummy_verification, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 14;

/// The only message a failed login ever reports
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (unknown user or wrong password)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Input rejected, reported against form fields
    #[error("Validation error: {0}")]
    ValidationError(FormErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_lifetime: Duration,
}

impl UserService {
    /// Create a new user service with the default session lifetime
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_lifetime(
            user_repo,
            session_repo,
            Duration::days(DEFAULT_SESSION_LIFETIME_DAYS),
        )
    }

    pub fn with_session_lifetime(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_lifetime: Duration,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_lifetime,
        }
    }

    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    /// Register a new account from already validated input.
    ///
    /// # Errors
    ///
    /// - `ValidationError` on the `username` field if the name is taken
    /// - `InternalError` for hashing or database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError(FormErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.username,
            input.email,
            password_hash,
            input.first_name,
            input.last_name,
        );

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Issue a new session for `user_id`
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::issue(user_id, self.session_lifetime);
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }

    /// Check credentials and open a session.
    ///
    /// Unknown usernames and wrong passwords fail identically, and both cost
    /// one password verification.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, UserServiceError> {
        let user = match self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
        {
            Some(user) => user,
            None => {
                spend_dummy_verification(password);
                tracing::warn!(username = %username, "Login failed: unknown user");
                return Err(UserServiceError::AuthenticationError(
                    INVALID_CREDENTIALS.to_string(),
                ));
            }
        };

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::warn!(username = %username, "Login failed: wrong password");
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let session = self.start_session(user.id).await?;
        self.user_repo
            .update_last_login(user.id, Utc::now())
            .await
            .context("Failed to update last login")?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(session)
    }

    /// Invalidate a session token. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Missing and expired sessions both yield `None`; an expired one is
    /// deleted on the way.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Delete every expired session, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    fn alice() -> CreateUserInput {
        CreateUserInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Xy9!abcd".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (_pool, service) = setup_test_service().await;

        let user = service.register(alice()).await.expect("Failed to register");

        assert!(user.id > 0);
        assert_eq!(user.first_name, "Alice");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (_pool, service) = setup_test_service().await;
        service.register(alice()).await.unwrap();

        let mut again = alice();
        again.email = "other@example.com".to_string();
        match service.register(again).await {
            Err(UserServiceError::ValidationError(errors)) => assert_eq!(
                errors.get("username"),
                &["A user with that username already exists.".to_string()]
            ),
            other => panic!("expected a username error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_success_updates_last_login() {
        let (_pool, service) = setup_test_service().await;
        let user = service.register(alice()).await.unwrap();

        let session = service.login("alice", "Xy9!abcd").await.expect("Failed to login");
        assert_eq!(session.user_id, user.id);
        assert!(!session.is_expired());

        let resolved = service
            .validate_session(&session.id)
            .await
            .unwrap()
            .expect("session should resolve");
        assert_eq!(resolved.id, user.id);
        assert!(resolved.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_pool, service) = setup_test_service().await;
        service.register(alice()).await.unwrap();

        let wrong_password = service.login("alice", "wrong-password").await.unwrap_err();
        let unknown_user = service.login("mallory", "Xy9!abcd").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(
            wrong_password,
            UserServiceError::AuthenticationError(ref m) if m == INVALID_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;
        service.register(alice()).await.unwrap();
        let session = service.login("alice", "Xy9!abcd").await.unwrap();

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());

        // Logging out twice is harmless
        service.logout(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let (pool, _) = setup_test_service().await;
        let service = UserService::with_session_lifetime(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            Duration::seconds(-1),
        );
        let user = service.register(alice()).await.unwrap();
        let session = service.start_session(user.id).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let (pool, _) = setup_test_service().await;
        let expired = UserService::with_session_lifetime(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            Duration::seconds(-1),
        );
        let user = expired.register(alice()).await.unwrap();
        expired.start_session(user.id).await.unwrap();
        expired.start_session(user.id).await.unwrap();

        assert_eq!(expired.cleanup_expired_sessions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (_pool, service) = setup_test_service().await;
        assert!(service.validate_session("no-such-token").await.unwrap().is_none());
    }
}
