use axum::{extract::State, http::StatusCode, routing::get, Router};
use serde_json::json;

use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))  // ✅ Liveness check
        .route("/health/ready", get(readiness_check)) // ✅ Readiness check
}

/// **Liveness Check (Basic Check)**
/// - ✅ Verifies that the API is running
/// - ❌ Does NOT check the database
async fn liveness_check() -> ApiResponse<()> {
    ApiResponse::success(StatusCode::OK, "API is live", ())
}

/// **Readiness Check (Database Connectivity Check)**
/// - ✅ Pings MongoDB
/// - ❌ Returns `503` if the database is down
async fn readiness_check(State(state): State<AppState>) -> Result<ApiResponse<()>, ApiResponse<()>> {
    state.store.ping().await.map_err(|e| {
        tracing::error!("Readiness check failed: {}", e);
        ApiResponse::error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
            Some(json!({ "details": e.to_string() })),
        )
    })?;

    Ok(ApiResponse::success(StatusCode::OK, "API is ready", ()))
}
