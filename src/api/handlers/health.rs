use axum::Json;
use crate::api::dtos::responses::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}
