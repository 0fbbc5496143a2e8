pub mod http_availability_source;
pub mod http_booking_gateway;
pub mod session;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use crate::error::BookingError;

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Status plus the server's `{"error", "code"}` body, tolerating bodies that are not JSON.
pub(crate) async fn read_error(res: Response) -> (StatusCode, ErrorBody) {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
        error: text,
        code: String::new(),
    });
    (status, body)
}

pub(crate) fn transport(e: reqwest::Error) -> BookingError {
    BookingError::Transport(e.to_string())
}
