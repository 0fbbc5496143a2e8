use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
    pub default_slots: i32,
    #[serde(default)]
    pub preparation_days: i32,
    #[serde(default)]
    pub base_price: f64,
}

/// Either `date`, or `start` and `end`.
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub days_ahead: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct OverrideRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct PackageOverrideRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_blocked: bool,
    pub override_slots: Option<i32>,
    pub reason: Option<String>,
}
