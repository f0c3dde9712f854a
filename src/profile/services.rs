use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{extractors::AuthUser, validation::validate_profile_update},
    error::{ApiError, ApiResult},
    state::AppState,
    users::{User, UserStore},
};

const USER_NOT_FOUND: &str = "User not found";
const FETCH_FAILED: &str = "Server error while fetching profile";
const UPDATE_FAILED: &str = "Server error while updating profile";

/// Reads and updates the caller's own record. The id always comes from the
/// verified token.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for ProfileService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, identity: &AuthUser) -> ApiResult<User> {
        self.fetch(identity.id, FETCH_FAILED).await
    }

    /// Only `full_name` is writable.
    pub async fn update(&self, identity: &AuthUser, full_name: &str) -> ApiResult<User> {
        validate_profile_update(full_name)?;
        let full_name = full_name.trim();

        let updated = self
            .store
            .update_full_name(identity.id, full_name)
            .await
            .map_err(|e| ApiError::internal(UPDATE_FAILED, e))?;
        if !updated {
            warn!(user_id = identity.id, "profile update for missing user");
            return Err(ApiError::NotFound(USER_NOT_FOUND.into()));
        }

        let user = self.fetch(identity.id, UPDATE_FAILED).await?;
        info!(user_id = user.id, "profile updated");
        Ok(user)
    }

    async fn fetch(&self, id: i64, failure: &str) -> ApiResult<User> {
        match self.store.find_by_id(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                warn!(user_id = id, "token refers to missing user");
                Err(ApiError::NotFound(USER_NOT_FOUND.into()))
            }
            Err(e) => Err(ApiError::internal(failure, e)),
        }
    }
}
