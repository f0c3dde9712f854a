use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{error, info, warn};

use crate::{
    auth::{
        jwt::TokenService,
        password::{hash_password_async, verify_password_async},
        validation::{validate_login, validate_registration},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{NewUser, StoreError, User, UserStore},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email already registered";
const REGISTER_FAILED: &str = "Server error during registration";
const LOGIN_FAILED: &str = "Server error during login";

/// A user together with a freshly issued session token.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Register and login over the user store, hasher and token service.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.tokens.clone())
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// The email pre-check only saves a hash on the common path. Concurrent
    /// registrations are settled by the store's unique constraint, which
    /// surfaces as the same conflict.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<Session> {
        validate_registration(full_name, email, password)?;
        let full_name = full_name.trim();
        let email = email.trim();

        match self.store.find_by_email(email).await {
            Ok(Some(_)) => {
                warn!(email = %email, "email already registered");
                return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
            }
            Ok(None) => {}
            Err(e) => return Err(ApiError::internal(REGISTER_FAILED, e)),
        }

        let hash = hash_password_async(password.to_string())
            .await
            .map_err(|e| ApiError::internal(REGISTER_FAILED, e))?;

        let new_user = NewUser {
            full_name,
            email,
            password_hash: &hash,
        };
        let user = match self.store.create(new_user).await {
            Ok(u) => u,
            Err(StoreError::DuplicateEmail) => {
                warn!(email = %email, "email registered concurrently");
                return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(ApiError::internal(REGISTER_FAILED, e));
            }
        };

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(|e| ApiError::internal(REGISTER_FAILED, e))?;

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(Session { user, token })
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        validate_login(email, password)?;
        let email = email.trim();

        let user = match self.store.find_by_email(email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(email = %email, "login unknown email");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
            Err(e) => return Err(ApiError::internal(LOGIN_FAILED, e)),
        };

        let ok = verify_password_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(|e| ApiError::internal(LOGIN_FAILED, e))?;

        if !ok {
            warn!(email = %email, user_id = user.id, "login invalid password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let token = self
            .tokens
            .issue(user.id, &user.email)
            .map_err(|e| ApiError::internal(LOGIN_FAILED, e))?;

        info!(user_id = user.id, email = %user.email, "user logged in");
        Ok(Session { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserStore;
    use async_trait::async_trait;
    use std::time::Duration;

    fn service() -> (AuthService, TokenService) {
        let tokens = TokenService::new("test-secret", Duration::from_secs(3600));
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        (AuthService::new(store, tokens.clone()), tokens)
    }

    /// Store whose every call fails, for the internal-error paths.
    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn find_by_id(&self, _id: i64) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn create(&self, _new_user: NewUser<'_>) -> Result<User, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn update_full_name(&self, _id: i64, _name: &str) -> Result<bool, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn register_then_login_returns_same_user() {
        let (auth, tokens) = service();
        let registered = auth
            .register("Jane Doe", "jane@x.com", "secret1")
            .await
            .unwrap();
        let logged_in = auth.login("jane@x.com", "secret1").await.unwrap();

        assert_eq!(registered.user.id, logged_in.user.id);
        let claims = tokens.verify(&logged_in.token).unwrap();
        assert_eq!(claims.id, registered.user.id);
        assert_eq!(claims.email, "jane@x.com");
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let (auth, _) = service();
        let session = auth
            .register("Jane Doe", "jane@x.com", "secret1")
            .await
            .unwrap();
        assert_ne!(session.user.password_hash, "secret1");
        assert!(session.user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_trims_name_and_email() {
        let (auth, _) = service();
        let session = auth
            .register("  Jane Doe ", " jane@x.com ", "secret1")
            .await
            .unwrap();
        assert_eq!(session.user.full_name, "Jane Doe");
        assert_eq!(session.user.email, "jane@x.com");
        assert!(auth.login("jane@x.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (auth, _) = service();
        auth.register("Jane Doe", "jane@x.com", "secret1")
            .await
            .unwrap();
        let err = auth
            .register("Other Jane", "jane@x.com", "another1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn concurrent_duplicate_registration_yields_one_conflict() {
        let (auth, _) = service();
        let (a, b) = tokio::join!(
            auth.register("Jane Doe", "jane@x.com", "secret1"),
            auth.register("Jane Doe", "jane@x.com", "secret1"),
        );
        let results = [a, b];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::Conflict(_))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (auth, _) = service();
        auth.register("Jane Doe", "jane@x.com", "secret1")
            .await
            .unwrap();

        let wrong = auth.login("jane@x.com", "wrong").await.unwrap_err();
        let unknown = auth.login("nobody@x.com", "secret1").await.unwrap_err();

        assert_eq!(wrong.status(), unknown.status());
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, ApiError::Unauthorized(ref m) if m == "Invalid email or password"));
    }

    #[tokio::test]
    async fn validation_runs_before_store() {
        let tokens = TokenService::new("test-secret", Duration::from_secs(3600));
        let auth = AuthService::new(Arc::new(BrokenStore), tokens);
        let err = auth.register("Jane Doe", "jane@x.com", "qwerty").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = auth.login("not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let tokens = TokenService::new("test-secret", Duration::from_secs(3600));
        let auth = AuthService::new(Arc::new(BrokenStore), tokens);
        let err = auth
            .register("Jane Doe", "jane@x.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal { ref message, .. } if message == "Server error during registration"));
        let err = auth.login("jane@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, ApiError::Internal { ref message, .. } if message == "Server error during login"));
    }
}
