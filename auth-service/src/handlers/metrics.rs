use axum::response::IntoResponse;

use crate::services::metrics::get_metrics;

/// Prometheus metrics in text exposition format
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics")
    ),
    tag = "Observability"
)]
pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
