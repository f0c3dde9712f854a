use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{dto::PublicUser, extractors::MaybeAuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::{auth, profile};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(profile::router()),
        )
        .route("/", get(welcome))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

/// Open to everyone; greets the caller by name when a valid token is sent.
async fn welcome(
    axum::extract::State(state): axum::extract::State<AppState>,
    MaybeAuthUser(identity): MaybeAuthUser,
) -> Json<Value> {
    let Some(identity) = identity else {
        return Json(json!({
            "success": true,
            "message": "Welcome to HasthiyaAuth API",
            "authenticated": false,
        }));
    };

    match state.store.find_by_id(identity.id).await {
        Ok(Some(user)) => Json(json!({
            "success": true,
            "message": format!("Welcome back, {}", user.full_name),
            "authenticated": true,
            "user": PublicUser::from(user),
        })),
        _ => Json(json!({
            "success": true,
            "message": "Welcome to HasthiyaAuth API",
            "authenticated": false,
        })),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "OK",
        "message": "Server is healthy",
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}
