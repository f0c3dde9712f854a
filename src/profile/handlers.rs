use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiResult,
    profile::{
        dto::{ProfileResponse, UpdateProfileRequest},
        services::ProfileService,
    },
    state::AppState,
    users::User,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/user/profile", get(get_profile).put(update_profile))
}

fn profile_response(message: &str, user: User) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        message: message.into(),
        user: user.into(),
    })
}

#[instrument(skip(profiles), fields(user_id = identity.id))]
pub async fn get_profile(
    State(profiles): State<ProfileService>,
    identity: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = profiles.get(&identity).await?;
    Ok(profile_response("Profile retrieved successfully", user))
}

#[instrument(skip(profiles, payload), fields(user_id = identity.id))]
pub async fn update_profile(
    State(profiles): State<ProfileService>,
    identity: AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Json(payload) = payload?;
    let user = profiles
        .update(&identity, payload.full_name.as_deref().unwrap_or_default())
        .await?;
    Ok(profile_response("Profile updated successfully", user))
}
