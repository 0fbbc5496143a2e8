use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use crate::domain::models::booking_form::BookingFormData;

/// In-progress booking parked while the guest authenticates.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PendingBooking {
    pub package_id: i64,
    pub form_data: BookingFormData,
    pub timestamp: DateTime<Utc>,
}

impl PendingBooking {
    pub fn new(package_id: i64, form: &BookingFormData, now: DateTime<Utc>) -> Self {
        Self {
            package_id,
            form_data: form.without_receipt(),
            timestamp: now,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp < ttl
    }
}
