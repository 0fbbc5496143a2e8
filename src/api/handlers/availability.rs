use axum::{extract::{State, Path, Query}, response::{IntoResponse, Response}, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{AvailabilityQuery, UpcomingQuery};
use crate::domain::models::availability::PreparationDays;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Days;

pub const DEFAULT_DAYS_AHEAD: u32 = 90;
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// `?date=` returns a single entry, `?start=&end=` a map keyed by ISO date.
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<i64>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<Response, AppError> {
    match (params.date, params.start, params.end) {
        (Some(date), None, None) => {
            let availability = state.availability.for_date(package_id, date).await?;
            Ok(Json(availability).into_response())
        }
        (None, Some(start), Some(end)) => {
            let range = state.availability.for_range(package_id, start, end).await?;
            Ok(Json(range).into_response())
        }
        _ => Err(AppError::Validation("Provide either date, or both start and end".into())),
    }
}

pub async fn get_preparation_days(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let preparation_days = state.availability.preparation_days(package_id).await?;
    Ok(Json(PreparationDays { package_id, preparation_days }))
}

/// Next bookable dates, starting tomorrow in the calendar timezone.
pub async fn get_upcoming(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<i64>,
    Query(params): Query<UpcomingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days_ahead = params.days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD);
    let limit = params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);

    let tomorrow = state.today().checked_add_days(Days::new(1)).ok_or(AppError::Internal)?;
    let upcoming = state.availability.upcoming(package_id, tomorrow, days_ahead, limit).await?;
    Ok(Json(upcoming))
}
