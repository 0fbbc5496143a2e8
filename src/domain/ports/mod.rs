use crate::domain::models::{
    availability::DateAvailability,
    booking::{Booking, BookingConfirmation},
    booking_form::BookingSubmission,
    package::Package,
    package_override::PackageOverride,
    user::SessionUser,
};
use crate::error::{AppError, BookingError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

// Server-side persistence

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn create(&self, package: &Package) -> Result<Package, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Package>, AppError>;
}

#[async_trait]
pub trait PackageOverrideRepository: Send + Sync {
    async fn upsert(&self, override_entity: &PackageOverride) -> Result<PackageOverride, AppError>;
    async fn list_by_range(&self, package_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<PackageOverride>, AppError>;
    async fn delete(&self, package_id: i64, date: NaiveDate) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    /// Slot-holding bookings whose wedding date lies in `[start, end]`.
    async fn list_active_by_range(&self, package_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Persists the receipt and returns an opaque reference to it.
    async fn save(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<String, AppError>;
}

// Client-side collaborators

/// Authentication as consumed by the booking core.
pub trait AuthContext: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn get_availability(&self, package_id: i64, date: NaiveDate) -> Result<DateAvailability, BookingError>;
    async fn get_availability_range(
        &self,
        package_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DateAvailability>, BookingError>;
    async fn get_preparation_days(&self, package_id: i64) -> Result<i32, BookingError>;
    async fn get_upcoming_availability(&self, package_id: i64, days_ahead: u32, limit: usize) -> Result<Vec<DateAvailability>, BookingError>;
}

#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn create_booking(&self, session: &SessionUser, submission: &BookingSubmission) -> Result<BookingConfirmation, BookingError>;
}

/// Device-scoped key-value storage. Last write wins; no transactions.
#[async_trait]
pub trait PendingBookingStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BookingError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), BookingError>;
    async fn delete(&self, key: &str) -> Result<(), BookingError>;
}
