use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-date exception to a package's defaults: a vendor blackout and/or a different slot count.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PackageOverride {
    pub id: String,
    pub package_id: i64,
    pub date: NaiveDate,
    pub is_blocked: bool,
    pub override_slots: Option<i32>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PackageOverride {
    pub fn new(package_id: i64, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            package_id,
            date,
            is_blocked: false,
            override_slots: None,
            reason: None,
            created_at: Utc::now(),
        }
    }
}
