use std::sync::Arc;
use chrono::NaiveDate;
use chrono_tz::Tz;
use crate::domain::ports::{
    AvailabilitySource, BookingGateway, BookingRepository, Clock, PackageOverrideRepository,
    PackageRepository, ReceiptStore,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::availability_service::AvailabilityService;
use crate::domain::services::booking_flow::BookingFlow;
use crate::domain::services::calendar_controller::CalendarController;
use crate::domain::services::recovery::PendingBookingRecovery;
use crate::infra::client::session::ClientSession;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub package_repo: Arc<dyn PackageRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub override_repo: Arc<dyn PackageOverrideRepository>,
    pub availability: Arc<AvailabilityService>,
    pub receipt_store: Arc<dyn ReceiptStore>,
    pub auth_service: Arc<AuthService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Current date in the calendar timezone. Same-day and past dates are never bookable.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.config.calendar_timezone).date_naive()
    }
}

/// Collaborators of the booking client: availability data, booking gateway, snapshot storage
/// and the signed-in session.
#[derive(Clone)]
pub struct ClientState {
    pub availability: Arc<dyn AvailabilitySource>,
    pub gateway: Arc<dyn BookingGateway>,
    pub recovery: Arc<PendingBookingRecovery>,
    pub session: Arc<ClientSession>,
    pub clock: Arc<dyn Clock>,
    pub timezone: Tz,
}

impl ClientState {
    pub fn booking_flow(&self, package_id: i64) -> BookingFlow {
        BookingFlow::new(
            package_id,
            self.session.clone(),
            self.clock.clone(),
            self.timezone,
            self.recovery.clone(),
            self.gateway.clone(),
        )
    }

    pub fn calendar(&self, package_id: i64) -> CalendarController {
        CalendarController::new(package_id, self.availability.clone(), self.clock.clone(), self.timezone)
    }
}
