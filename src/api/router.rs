use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, package, availability, package_override, booking};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Packages
        .route("/api/v1/packages", post(package::create_package))
        .route("/api/v1/packages/{package_id}", get(package::get_package))

        // Availability (public)
        .route("/api/v1/packages/{package_id}/availability", get(availability::get_availability))
        .route("/api/v1/packages/{package_id}/availability/upcoming", get(availability::get_upcoming))
        .route("/api/v1/packages/{package_id}/preparation-days", get(availability::get_preparation_days))

        // Planner overrides
        .route("/api/v1/packages/{package_id}/overrides", put(package_override::upsert_override).get(package_override::list_overrides))
        .route("/api/v1/packages/{package_id}/overrides/{date}", delete(package_override::delete_override))

        // Bookings
        .route("/api/v1/packages/{package_id}/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
