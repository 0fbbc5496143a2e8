use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use std::fmt;
use std::str::FromStr;

pub const BOOKING_ID_PREFIX: &str = "WB-";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }

    /// Cancelled and rejected bookings release their slot; every other state holds it.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Rejected)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub package_id: i64,
    pub client_id: String,
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<NaiveTime>,
    pub venue: String,
    pub special_requests: Option<String>,
    pub payment_method: String,
    pub payment_amount: f64,
    pub receipt_ref: String,
    pub marketing_opt_in: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub package_id: i64,
    pub client_id: String,
    pub wedding_date: NaiveDate,
    pub wedding_time: Option<NaiveTime>,
    pub venue: String,
    pub special_requests: Option<String>,
    pub payment_method: String,
    pub payment_amount: f64,
    pub receipt_ref: String,
    pub marketing_opt_in: bool,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: generate_booking_id(),
            package_id: params.package_id,
            client_id: params.client_id,
            wedding_date: params.wedding_date,
            wedding_time: params.wedding_time,
            venue: params.venue,
            special_requests: params.special_requests,
            payment_method: params.payment_method,
            payment_amount: params.payment_amount,
            receipt_ref: params.receipt_ref,
            marketing_opt_in: params.marketing_opt_in,
            status: BookingStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Unknown status strings are treated as holding a slot.
    pub fn occupies_slot(&self) -> bool {
        self.status.parse::<BookingStatus>()
            .map(|s| s.occupies_slot())
            .unwrap_or(true)
    }
}

pub fn generate_booking_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}{}", BOOKING_ID_PREFIX, suffix)
}

/// What the booking endpoint hands back on success.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_id_format() {
        let id = generate_booking_id();
        assert!(id.starts_with("WB-"));
        assert_eq!(id.len(), 13);
        assert!(id[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_slot_occupancy_by_status() {
        assert!(BookingStatus::Pending.occupies_slot());
        assert!(BookingStatus::Confirmed.occupies_slot());
        assert!(BookingStatus::Completed.occupies_slot());
        assert!(!BookingStatus::Cancelled.occupies_slot());
        assert!(!BookingStatus::Rejected.occupies_slot());
        assert_eq!("CANCELLED".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
    }
}
