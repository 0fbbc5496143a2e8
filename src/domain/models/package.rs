use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::error::BookingError;

/// Longest preparation window a package may declare.
pub const MAX_PREPARATION_DAYS: i32 = 365;

/// A dated, slot-limited wedding package sold by a planner.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Package {
    pub id: i64,
    pub planner_id: String,
    pub name: String,
    pub default_slots: i32,
    pub preparation_days: i32,
    pub base_price: f64,
    pub created_at: DateTime<Utc>,
}

impl Package {
    pub fn new(planner_id: String, name: String, default_slots: i32, preparation_days: i32, base_price: f64) -> Self {
        Self {
            id: 0,
            planner_id,
            name,
            default_slots,
            preparation_days,
            base_price,
            created_at: Utc::now(),
        }
    }

    /// Rejects package rows that would make availability meaningless.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.default_slots <= 0 {
            return Err(BookingError::Configuration(format!(
                "package {} has non-positive default_slots ({})",
                self.id, self.default_slots
            )));
        }
        if self.preparation_days < 0 {
            return Err(BookingError::Configuration(format!(
                "package {} has negative preparation_days ({})",
                self.id, self.preparation_days
            )));
        }
        if self.preparation_days > MAX_PREPARATION_DAYS {
            return Err(BookingError::Configuration(format!(
                "package {} has preparation_days ({}) above {}",
                self.id, self.preparation_days, MAX_PREPARATION_DAYS
            )));
        }
        Ok(())
    }
}
