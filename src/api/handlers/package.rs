use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::CreatePackageRequest;
use crate::domain::models::package::Package;
use crate::domain::models::user::UserRole;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_package(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let planner = user.require_role(UserRole::Planner)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Package name is required".into()));
    }

    let package = Package::new(
        planner.id.clone(),
        payload.name.trim().to_string(),
        payload.default_slots,
        payload.preparation_days,
        payload.base_price,
    );
    package.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.package_repo.create(&package).await?;
    info!(package_id = created.id, planner_id = %created.planner_id, "package created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let package = state.availability.load_package(package_id).await?;
    Ok(Json(package))
}
