use std::collections::BTreeMap;
use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use crate::domain::models::availability::{DateAvailability, PreparationDays};
use crate::domain::ports::AvailabilitySource;
use crate::error::BookingError;
use super::{read_error, transport};

/// Availability data source backed by the booking service's HTTP API.
pub struct HttpAvailabilitySource {
    client: Client,
    base_url: String,
}

impl HttpAvailabilitySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, package_id: i64, path: &str) -> String {
        format!("{}/api/v1/packages/{}/{}", self.base_url, package_id, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, BookingError> {
        debug!(url, "fetching availability");
        let res = self.client.get(url).query(query).send().await.map_err(transport)?;

        if res.status().is_success() {
            return res.json::<T>().await.map_err(transport);
        }

        let (status, body) = read_error(res).await;
        warn!(url, status = status.as_u16(), "availability request failed: {}", body.error);
        Err(match (status, body.code.as_str()) {
            (_, "configuration") => BookingError::Configuration(body.error),
            (StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND, _) => BookingError::Validation(body.error),
            _ => BookingError::Transport(format!("{}: {}", status, body.error)),
        })
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl AvailabilitySource for HttpAvailabilitySource {
    async fn get_availability(&self, package_id: i64, date: NaiveDate) -> Result<DateAvailability, BookingError> {
        self.get_json(&self.url(package_id, "availability"), &[("date", iso(date))]).await
    }

    async fn get_availability_range(
        &self,
        package_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DateAvailability>, BookingError> {
        self.get_json(
            &self.url(package_id, "availability"),
            &[("start", iso(start)), ("end", iso(end))],
        ).await
    }

    async fn get_preparation_days(&self, package_id: i64) -> Result<i32, BookingError> {
        let body: PreparationDays = self.get_json(&self.url(package_id, "preparation-days"), &[]).await?;
        Ok(body.preparation_days)
    }

    async fn get_upcoming_availability(&self, package_id: i64, days_ahead: u32, limit: usize) -> Result<Vec<DateAvailability>, BookingError> {
        self.get_json(
            &self.url(package_id, "availability/upcoming"),
            &[("days_ahead", days_ahead.to_string()), ("limit", limit.to_string())],
        ).await
    }
}
