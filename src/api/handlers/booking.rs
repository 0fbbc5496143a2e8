use axum::{extract::{State, Path, Multipart}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::booking::{Booking, BookingConfirmation, BookingStatus, NewBookingParams};
use crate::domain::models::booking_form::{BookingFormData, PaymentMethod, ReceiptFile};
use crate::domain::models::user::UserRole;
use crate::domain::services::submission::build_submission;
use crate::domain::services::wizard::{validate_confirmation, validate_details};
use crate::error::AppError;
use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        _ => Err(AppError::Validation(format!("Invalid value for {}", name))),
    }
}

/// Reads the multipart booking payload back into typed form data.
async fn read_booking_form(mut multipart: Multipart) -> Result<BookingFormData, AppError> {
    let mut form = BookingFormData::default();

    while let Some(field) = multipart.next_field().await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "receipt" {
            let file_name = field.file_name().unwrap_or("receipt").to_string();
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let bytes = field.bytes().await
                .map_err(|e| AppError::Validation(format!("Could not read receipt: {}", e)))?;
            form.receipt = Some(ReceiptFile { file_name, content_type, bytes: bytes.to_vec() });
            continue;
        }

        let value = field.text().await
            .map_err(|e| AppError::Validation(format!("Could not read field {}: {}", name, e)))?;

        match name.as_str() {
            "wedding_date" => {
                form.wedding_date = Some(NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| AppError::Validation("Invalid date format".into()))?);
            }
            "wedding_time" if !value.trim().is_empty() => {
                form.wedding_time = Some(NaiveTime::parse_from_str(value.trim(), "%H:%M")
                    .map_err(|_| AppError::Validation("Invalid time format (HH:MM)".into()))?);
            }
            "wedding_time" => {}
            "venue" => form.venue = value,
            "special_requests" => form.special_requests = value,
            "payment_method" => {
                form.payment_method = Some(value.parse::<PaymentMethod>().map_err(AppError::Validation)?);
            }
            "payment_amount" => {
                form.payment_amount = Some(value.trim().parse::<f64>()
                    .map_err(|_| AppError::Validation("Invalid payment amount".into()))?);
            }
            "accept_terms" => form.accept_terms = parse_flag(&name, &value)?,
            "accept_privacy" => form.accept_privacy = parse_flag(&name, &value)?,
            "marketing_opt_in" => form.marketing_opt_in = parse_flag(&name, &value)?,
            other => debug!("ignoring unknown booking field {}", other),
        }
    }

    Ok(form)
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(package_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let client = user.require_role(UserRole::Client)?;
    let package = state.availability.load_package(package_id).await?;

    let form = read_booking_form(multipart).await?;

    // Never trust the client's earlier validation.
    let today = state.today();
    validate_details(&form, today).into_result()?;
    validate_confirmation(&form).into_result()?;
    let submission = build_submission(package.id, &form)?;

    info!("create_booking: Checking availability for package {} on {}", package.id, submission.wedding_date);
    let availability = state.availability.for_date(package.id, submission.wedding_date).await?;
    if !availability.available {
        warn!(package_id = package.id, date = %submission.wedding_date, "booking rejected, date not available");
        let reason = availability.reason.unwrap_or_else(|| "The selected date is no longer available".into());
        return Err(AppError::Conflict(reason));
    }

    let receipt = &submission.receipt;
    let receipt_ref = state.receipt_store.save(&receipt.file_name, &receipt.content_type, &receipt.bytes).await?;

    let special_requests = Some(submission.special_requests.clone()).filter(|s| !s.is_empty());
    let booking = Booking::new(NewBookingParams {
        package_id: package.id,
        client_id: client.id.clone(),
        wedding_date: submission.wedding_date,
        wedding_time: submission.wedding_time,
        venue: submission.venue.clone(),
        special_requests,
        payment_method: submission.payment_method.as_str().to_string(),
        payment_amount: submission.payment_amount,
        receipt_ref,
        marketing_opt_in: submission.marketing_opt_in,
    });

    let created = state.booking_repo.create(&booking).await?;
    info!(booking_id = %created.id, package_id = package.id, "booking created");

    Ok((
        StatusCode::CREATED,
        Json(BookingConfirmation { booking_id: created.id, status: BookingStatus::Pending }),
    ))
}

/// Visible to the booking's client, the package's planner and admins.
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    let allowed = match user.role {
        UserRole::Admin => true,
        UserRole::Client => booking.client_id == user.id,
        UserRole::Planner => {
            let package = state.availability.load_package(booking.package_id).await?;
            package.planner_id == user.id
        }
    };
    if !allowed {
        return Err(AppError::NotFound("Booking not found".into()));
    }

    Ok(Json(booking))
}
