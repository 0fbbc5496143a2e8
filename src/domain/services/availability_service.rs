use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{Days, NaiveDate};
use tracing::debug;
use crate::domain::models::{availability::DateAvailability, package::Package};
use crate::domain::ports::{BookingRepository, PackageOverrideRepository, PackageRepository};
use crate::domain::services::availability::{upcoming_available, AvailabilityResolver, MAX_RANGE_DAYS};
use crate::error::AppError;

/// Loads package data from the repositories and runs it through the resolver.
pub struct AvailabilityService {
    package_repo: Arc<dyn PackageRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    override_repo: Arc<dyn PackageOverrideRepository>,
    resolver: AvailabilityResolver,
}

impl AvailabilityService {
    pub fn new(
        package_repo: Arc<dyn PackageRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        override_repo: Arc<dyn PackageOverrideRepository>,
        resolver: AvailabilityResolver,
    ) -> Self {
        Self { package_repo, booking_repo, override_repo, resolver }
    }

    pub async fn load_package(&self, package_id: i64) -> Result<Package, AppError> {
        self.package_repo.find_by_id(package_id).await?
            .ok_or_else(|| AppError::NotFound(format!("Package {} not found", package_id)))
    }

    pub async fn for_date(&self, package_id: i64, date: NaiveDate) -> Result<DateAvailability, AppError> {
        let package = self.load_package(package_id).await?;
        let mut range = self.resolve(&package, date, date).await?;
        range.remove(&date).ok_or(AppError::Internal)
    }

    pub async fn for_range(
        &self,
        package_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DateAvailability>, AppError> {
        let package = self.load_package(package_id).await?;
        self.resolve(&package, start, end).await
    }

    pub async fn preparation_days(&self, package_id: i64) -> Result<i32, AppError> {
        let package = self.load_package(package_id).await?;
        package.validate()?;
        Ok(package.preparation_days)
    }

    /// Bookable dates from `from` onwards, looking at most `days_ahead` days ahead.
    pub async fn upcoming(
        &self,
        package_id: i64,
        from: NaiveDate,
        days_ahead: u32,
        limit: usize,
    ) -> Result<Vec<DateAvailability>, AppError> {
        let package = self.load_package(package_id).await?;
        if days_ahead == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let span = (days_ahead as i64).min(MAX_RANGE_DAYS) as u64;
        let end = from.checked_add_days(Days::new(span - 1))
            .ok_or_else(|| AppError::Validation("days_ahead is out of range".into()))?;

        let range = self.resolve(&package, from, end).await?;
        Ok(upcoming_available(&range, limit))
    }

    async fn resolve(
        &self,
        package: &Package,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DateAvailability>, AppError> {
        package.validate()?;

        // Bookings shortly before the range still cast preparation windows into it.
        let lookback = start.checked_sub_days(Days::new(package.preparation_days as u64)).unwrap_or(NaiveDate::MIN);

        let bookings = self.booking_repo.list_active_by_range(package.id, lookback, end).await?;
        let overrides = self.override_repo.list_by_range(package.id, start, end).await?;

        debug!(
            package_id = package.id,
            bookings = bookings.len(),
            overrides = overrides.len(),
            "resolving availability {}..{}", start, end
        );

        Ok(self.resolver.resolve_range(package, start, end, &bookings, &overrides)?)
    }
}
