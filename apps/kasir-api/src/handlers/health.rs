use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::HealthResponse;
use crate::AppState;

/// Liveness plus a `SELECT 1` against the pool.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = state.db.health_check().await;

    let (status, database) = if database_ok {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: if database_ok { "ok" } else { "degraded" },
            service: "kasir-api",
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
