use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{OverrideRangeQuery, PackageOverrideRequest};
use crate::api::dtos::responses::DeletedResponse;
use crate::domain::models::package::Package;
use crate::domain::models::package_override::PackageOverride;
use crate::domain::models::user::UserRole;
use crate::error::AppError;
use std::sync::Arc;
use chrono::{Days, NaiveDate};
use tracing::info;

/// Loads the package and checks that the caller is the planner who owns it.
async fn owned_package(state: &AppState, user: &AuthUser, package_id: i64) -> Result<Package, AppError> {
    let caller = user.require_role(UserRole::Planner)?;
    let package = state.availability.load_package(package_id).await?;

    if caller.role != UserRole::Admin && package.planner_id != caller.id {
        return Err(AppError::Forbidden("You do not manage this package".into()));
    }
    Ok(package)
}

pub async fn upsert_override(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(package_id): Path<i64>,
    Json(payload): Json<PackageOverrideRequest>,
) -> Result<impl IntoResponse, AppError> {
    let package = owned_package(&state, &user, package_id).await?;

    if let Some(slots) = payload.override_slots
        && slots < 0 {
        return Err(AppError::Validation("override_slots must not be negative".into()));
    }

    let mut entity = PackageOverride::new(package.id, payload.date);
    entity.is_blocked = payload.is_blocked;
    entity.override_slots = payload.override_slots;
    entity.reason = payload.reason.filter(|r| !r.trim().is_empty());

    let saved = state.override_repo.upsert(&entity).await?;
    info!("Upserted override for package {} on {}", package.id, payload.date);
    Ok(Json(saved))
}

pub async fn list_overrides(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(package_id): Path<i64>,
    Query(params): Query<OverrideRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let package = owned_package(&state, &user, package_id).await?;

    let start = params.start.unwrap_or_else(|| state.today());
    let end = match params.end {
        Some(end) => end,
        None => start.checked_add_days(Days::new(365)).ok_or(AppError::Internal)?,
    };
    if start > end {
        return Err(AppError::Validation("start must not be after end".into()));
    }

    let overrides = state.override_repo.list_by_range(package.id, start, end).await?;
    Ok(Json(overrides))
}

pub async fn delete_override(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((package_id, date_str)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let package = owned_package(&state, &user, package_id).await?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date".into()))?;

    state.override_repo.delete(package.id, date).await?;
    info!("Deleted override for package {} on {}", package.id, date_str);
    Ok(Json(DeletedResponse { status: "deleted" }))
}
