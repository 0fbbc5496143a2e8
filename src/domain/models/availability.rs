use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

/// Derived slot picture for one package on one calendar date.
///
/// `is_preparation_period` implies `is_blocked`, and `booked_slots` never exceeds `total_slots`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub total_slots: i32,
    pub booked_slots: i32,
    pub available_slots: i32,
    pub available: bool,
    pub is_blocked: bool,
    pub is_preparation_period: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DateAvailability {
    pub fn open(date: NaiveDate, total_slots: i32) -> Self {
        Self {
            date,
            total_slots,
            booked_slots: 0,
            available_slots: total_slots,
            available: total_slots > 0,
            is_blocked: false,
            is_preparation_period: false,
            reason: None,
        }
    }

    /// Share of slots still open, in `[0, 1]`.
    pub fn remaining_ratio(&self) -> f64 {
        if self.total_slots <= 0 {
            0.0
        } else {
            self.available_slots as f64 / self.total_slots as f64
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PreparationDays {
    pub package_id: i64,
    pub preparation_days: i32,
}
