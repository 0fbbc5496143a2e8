use std::fmt;
use std::sync::Arc;
use chrono::Duration;
use tracing::{debug, info, warn};
use crate::domain::models::booking_form::BookingFormData;
use crate::domain::models::pending_booking::PendingBooking;
use crate::domain::ports::{Clock, PendingBookingStore};
use crate::error::BookingError;

/// Device-wide key. There is at most one live snapshot, whoever wrote it.
pub const PENDING_BOOKING_KEY: &str = "pendingBooking";
pub const DEFAULT_PENDING_TTL_SECS: i64 = 300;

/// Where the login page sends the user after authenticating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnDestination {
    pub package_id: i64,
    pub resume: bool,
}

impl ReturnDestination {
    pub fn booking(package_id: i64) -> Self {
        Self { package_id, resume: true }
    }

    pub fn to_path(&self) -> String {
        if self.resume {
            format!("/packages/{}/book?resume=1", self.package_id)
        } else {
            format!("/packages/{}/book", self.package_id)
        }
    }

    /// Parses a return path. Anything that is not a booking flow path yields `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let package_id = path
            .strip_prefix("/packages/")?
            .strip_suffix("/book")?
            .parse()
            .ok()?;
        let resume = query.split('&').any(|pair| pair == "resume=1" || pair == "resume=true");
        Some(Self { package_id, resume })
    }
}

impl fmt::Display for ReturnDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

/// Parks a guest's details while they sign in, and hands them back exactly once.
pub struct PendingBookingRecovery {
    store: Arc<dyn PendingBookingStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PendingBookingRecovery {
    pub fn new(store: Arc<dyn PendingBookingStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Writes the snapshot (overwriting any earlier one) and returns where login should come back to.
    pub async fn snapshot(&self, package_id: i64, form: &BookingFormData) -> Result<ReturnDestination, BookingError> {
        let pending = PendingBooking::new(package_id, form, self.clock.now());
        let json = serde_json::to_string(&pending)
            .map_err(|e| BookingError::Storage(format!("Failed to encode pending booking: {}", e)))?;

        self.store.set(PENDING_BOOKING_KEY, &json).await?;
        info!(package_id, "pending booking saved before login");
        Ok(ReturnDestination::booking(package_id))
    }

    /// Reads and deletes the snapshot. Returns its form only if it is fresh and belongs to `package_id`.
    pub async fn take(&self, package_id: i64) -> Option<BookingFormData> {
        let raw = match self.store.get(PENDING_BOOKING_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("could not read pending booking: {}", e);
                None
            }
        };

        if let Err(e) = self.store.delete(PENDING_BOOKING_KEY).await {
            warn!("could not delete pending booking: {}", e);
        }

        let raw = raw?;
        let pending: PendingBooking = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("dropping malformed pending booking: {}", e);
                return None;
            }
        };

        if !pending.is_fresh(self.clock.now(), self.ttl) {
            debug!(package_id = pending.package_id, "dropping expired pending booking");
            return None;
        }
        if pending.package_id != package_id {
            debug!(
                snapshot_package = pending.package_id,
                package_id, "dropping pending booking for another package"
            );
            return None;
        }

        info!(package_id, "pending booking restored after login");
        Some(pending.form_data)
    }

    pub async fn clear(&self) -> Result<(), BookingError> {
        self.store.delete(PENDING_BOOKING_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::clock::ManualClock;
    use crate::infra::storage::memory_pending_store::MemoryPendingBookingStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn setup() -> (Arc<MemoryPendingBookingStore>, Arc<ManualClock>, PendingBookingRecovery) {
        let store = Arc::new(MemoryPendingBookingStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap()));
        let recovery = PendingBookingRecovery::new(store.clone(), clock.clone(), Duration::minutes(5));
        (store, clock, recovery)
    }

    fn details() -> BookingFormData {
        BookingFormData {
            wedding_date: NaiveDate::from_ymd_opt(2025, 12, 20),
            venue: "Garden Hall".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fresh_snapshot_restores_once() {
        let (store, clock, recovery) = setup();
        let dest = recovery.snapshot(7, &details()).await.unwrap();
        assert_eq!(dest.to_path(), "/packages/7/book?resume=1");

        clock.advance(Duration::minutes(2));
        let restored = recovery.take(7).await.unwrap();
        assert_eq!(restored.venue, "Garden Hall");

        assert!(recovery.take(7).await.is_none());
        assert!(store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_dropped_and_deleted() {
        let (store, clock, recovery) = setup();
        recovery.snapshot(7, &details()).await.unwrap();

        clock.advance(Duration::minutes(6));
        assert!(recovery.take(7).await.is_none());
        assert!(store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exactly_ttl_old_is_expired() {
        let (_store, clock, recovery) = setup();
        recovery.snapshot(7, &details()).await.unwrap();
        clock.advance(Duration::minutes(5));
        assert!(recovery.take(7).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_for_other_package_is_not_restored() {
        let (store, _clock, recovery) = setup();
        recovery.snapshot(3, &details()).await.unwrap();

        assert!(recovery.take(7).await.is_none());
        assert!(store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_snapshot_overwrites_first() {
        let (_store, _clock, recovery) = setup();
        recovery.snapshot(3, &details()).await.unwrap();
        let mut other = details();
        other.venue = "Beach Resort".into();
        recovery.snapshot(7, &other).await.unwrap();

        assert_eq!(recovery.take(7).await.unwrap().venue, "Beach Resort");
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_ignored() {
        let (store, _clock, recovery) = setup();
        store.set(PENDING_BOOKING_KEY, "{not json").await.unwrap();
        assert!(recovery.take(7).await.is_none());
        assert!(store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[test]
    fn test_return_destination_parsing() {
        assert_eq!(ReturnDestination::parse("/packages/7/book?resume=1"), Some(ReturnDestination::booking(7)));
        assert_eq!(
            ReturnDestination::parse("/packages/7/book"),
            Some(ReturnDestination { package_id: 7, resume: false })
        );
        assert_eq!(ReturnDestination::parse("/dashboard"), None);
        assert_eq!(ReturnDestination::parse("/packages/abc/book?resume=1"), None);
    }
}
