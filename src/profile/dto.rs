use serde::{Deserialize, Serialize};

use crate::auth::dto::PublicUser;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}
