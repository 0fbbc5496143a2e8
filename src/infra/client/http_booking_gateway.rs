use std::time::Duration;
use async_trait::async_trait;
use reqwest::{multipart::{Form, Part}, Client, StatusCode};
use tracing::{error, info};
use crate::domain::models::booking::BookingConfirmation;
use crate::domain::models::booking_form::BookingSubmission;
use crate::domain::models::user::SessionUser;
use crate::domain::ports::BookingGateway;
use crate::error::BookingError;
use super::{read_error, transport};

/// Sends bookings to the booking endpoint as `multipart/form-data`.
pub struct HttpBookingGateway {
    client: Client,
    base_url: String,
}

impl HttpBookingGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

pub fn build_form(submission: &BookingSubmission) -> Result<Form, BookingError> {
    let mut form = Form::new();
    for (name, value) in submission.text_fields() {
        form = form.text(name, value);
    }

    let receipt = &submission.receipt;
    let part = Part::bytes(receipt.bytes.clone())
        .file_name(receipt.file_name.clone())
        .mime_str(&receipt.content_type)
        .map_err(|_| BookingError::Validation(format!("Unsupported receipt type '{}'", receipt.content_type)))?;

    Ok(form.part("receipt", part))
}

#[async_trait]
impl BookingGateway for HttpBookingGateway {
    async fn create_booking(&self, session: &SessionUser, submission: &BookingSubmission) -> Result<BookingConfirmation, BookingError> {
        let url = format!("{}/api/v1/packages/{}/bookings", self.base_url, submission.package_id);
        let form = build_form(submission)?;

        let res = self.client.post(&url)
            .header("Cookie", format!("access_token={}", session.access_token))
            .header("X-CSRF-Token", &session.csrf_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Booking endpoint connection error: {}", e);
                transport(e)
            })?;

        if res.status().is_success() {
            let confirmation = res.json::<BookingConfirmation>().await.map_err(transport)?;
            info!(booking_id = %confirmation.booking_id, "booking accepted");
            return Ok(confirmation);
        }

        let (status, body) = read_error(res).await;
        Err(match status {
            StatusCode::UNAUTHORIZED => BookingError::SessionExpired,
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                BookingError::Validation(body.error)
            }
            _ => {
                error!(status = status.as_u16(), "booking endpoint failed: {}", body.error);
                BookingError::Transport(format!("{}: {}", status, body.error))
            }
        })
    }
}
