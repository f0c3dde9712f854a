use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        services::{AuthService, Session},
    },
    error::ApiResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn auth_response(message: &str, session: Session) -> Json<AuthResponse> {
    Json(AuthResponse {
        success: true,
        message: message.into(),
        user: session.user.into(),
        token: session.token,
    })
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let session = auth
        .register(
            payload.full_name.as_deref().unwrap_or_default(),
            payload.email.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        auth_response("User registered successfully", session),
    ))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let session = auth
        .login(
            payload.email.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(auth_response("Login successful", session))
}
