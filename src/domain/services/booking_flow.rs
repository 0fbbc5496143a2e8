use std::sync::Arc;
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, info};
use crate::domain::models::booking::BookingConfirmation;
use crate::domain::models::booking_form::BookingFormData;
use crate::domain::ports::{AuthContext, BookingGateway, Clock};
use crate::domain::services::recovery::{PendingBookingRecovery, ReturnDestination};
use crate::domain::services::submission::SubmissionPipeline;
use crate::domain::services::wizard::{BookingWizard, StepValidation, WizardStep};
use crate::error::BookingError;

/// Result of asking the flow to move forward.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Step(WizardStep),
    /// The guest has to sign in first; their details were saved and login should return here.
    RedirectToLogin { return_to: ReturnDestination },
}

/// The booking page's view of the core: date selection, validation, navigation, submit and reset.
pub struct BookingFlow {
    wizard: BookingWizard,
    auth: Arc<dyn AuthContext>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    recovery: Arc<PendingBookingRecovery>,
    pipeline: SubmissionPipeline,
}

impl BookingFlow {
    pub fn new(
        package_id: i64,
        auth: Arc<dyn AuthContext>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        recovery: Arc<PendingBookingRecovery>,
        gateway: Arc<dyn BookingGateway>,
    ) -> Self {
        let pipeline = SubmissionPipeline::new(gateway, recovery.clone());
        Self {
            wizard: BookingWizard::new(package_id),
            auth,
            clock,
            timezone,
            recovery,
            pipeline,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    /// Date-selection callback for the calendar. Takes the ISO date of the clicked cell.
    pub fn select_date(&mut self, iso_date: &str) -> Result<(), BookingError> {
        let date = NaiveDate::parse_from_str(iso_date, "%Y-%m-%d")
            .map_err(|_| BookingError::Validation(format!("Invalid date '{}'", iso_date)))?;
        self.wizard.select_date(date);
        Ok(())
    }

    pub fn edit<F: FnOnce(&mut BookingFormData)>(&mut self, apply: F) {
        self.wizard.edit(apply);
    }

    pub fn validation(&self) -> StepValidation {
        self.wizard.validation(self.today())
    }

    pub async fn next(&mut self) -> Result<FlowOutcome, BookingError> {
        let today = self.today();
        match self.wizard.advance(today, self.auth.is_authenticated()) {
            Ok(step) => Ok(FlowOutcome::Step(step)),
            Err(BookingError::AuthenticationRequired) => {
                let return_to = self.recovery.snapshot(self.wizard.package_id(), self.wizard.form()).await?;
                Ok(FlowOutcome::RedirectToLogin { return_to })
            }
            Err(e) => Err(e),
        }
    }

    pub fn back(&mut self) -> Result<WizardStep, BookingError> {
        self.wizard.back()
    }

    /// Called when login hands control back. Restores a parked booking if the return path asks
    /// for it; otherwise leaves the wizard alone.
    pub async fn resume_after_login(&mut self, return_to: &str) -> WizardStep {
        let wants_resume = ReturnDestination::parse(return_to).is_some_and(|d| d.resume);
        if !wants_resume || !self.auth.is_authenticated() {
            debug!(return_to, "login return does not resume a booking");
            return self.wizard.step();
        }

        let package_id = self.wizard.package_id();
        let Some(form) = self.recovery.take(package_id).await else {
            return self.wizard.step();
        };

        let today = self.today();
        match self.wizard.restore(form, today) {
            Ok(step) => {
                info!(package_id, "booking resumed at {}", step);
                step
            }
            Err(e) => {
                debug!(package_id, "pending booking not applied: {}", e);
                self.wizard.step()
            }
        }
    }

    pub async fn submit(&mut self) -> Result<BookingConfirmation, BookingError> {
        let today = self.today();
        self.pipeline.submit(&mut self.wizard, self.auth.as_ref(), today).await
    }

    pub fn reset(&mut self) {
        self.wizard.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use crate::domain::models::booking::{generate_booking_id, BookingStatus};
    use crate::domain::models::booking_form::{BookingSubmission, PaymentMethod, ReceiptFile};
    use crate::domain::models::user::{SessionUser, UserRole};
    use crate::domain::ports::PendingBookingStore;
    use crate::domain::services::recovery::PENDING_BOOKING_KEY;
    use crate::infra::client::session::ClientSession;
    use crate::infra::clock::ManualClock;
    use crate::infra::storage::memory_pending_store::MemoryPendingBookingStore;

    struct AcceptingGateway;

    #[async_trait]
    impl BookingGateway for AcceptingGateway {
        async fn create_booking(&self, _session: &SessionUser, _submission: &BookingSubmission) -> Result<BookingConfirmation, BookingError> {
            Ok(BookingConfirmation { booking_id: generate_booking_id(), status: BookingStatus::Pending })
        }
    }

    struct Device {
        store: Arc<MemoryPendingBookingStore>,
        clock: Arc<ManualClock>,
        session: Arc<ClientSession>,
        recovery: Arc<PendingBookingRecovery>,
    }

    impl Device {
        fn new() -> Self {
            let store = Arc::new(MemoryPendingBookingStore::new());
            let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap()));
            let recovery = Arc::new(PendingBookingRecovery::new(store.clone(), clock.clone(), Duration::minutes(5)));
            Self { store, clock, session: Arc::new(ClientSession::new()), recovery }
        }

        fn open(&self, package_id: i64) -> BookingFlow {
            BookingFlow::new(
                package_id,
                self.session.clone(),
                self.clock.clone(),
                chrono_tz::Asia::Manila,
                self.recovery.clone(),
                Arc::new(AcceptingGateway),
            )
        }

        fn log_in(&self) {
            self.session.sign_in(SessionUser {
                id: "client-1".into(),
                role: UserRole::Client,
                access_token: "token".into(),
                csrf_token: "csrf".into(),
            });
        }
    }

    async fn guest_enters_details(device: &Device) -> ReturnDestination {
        let mut flow = device.open(7);
        flow.select_date("2025-12-20").unwrap();
        flow.edit(|f| f.venue = "Garden Hall".into());
        match flow.next().await.unwrap() {
            FlowOutcome::RedirectToLogin { return_to } => return_to,
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guest_detour_within_ttl_completes_booking() {
        let device = Device::new();
        let return_to = guest_enters_details(&device).await;
        assert_eq!(return_to, ReturnDestination::booking(7));
        assert!(device.store.get(PENDING_BOOKING_KEY).await.unwrap().is_some());

        device.clock.advance(Duration::minutes(2));
        device.log_in();

        let mut flow = device.open(7);
        assert_eq!(flow.resume_after_login(&return_to.to_path()).await, WizardStep::Confirmation);
        let form = flow.wizard().form();
        assert_eq!(form.wedding_date, NaiveDate::from_ymd_opt(2025, 12, 20));
        assert_eq!(form.venue, "Garden Hall");
        assert_eq!(form.payment_method, None);
        assert_eq!(form.payment_amount, None);

        flow.edit(|f| {
            f.payment_method = Some(PaymentMethod::Gcash);
            f.payment_amount = Some(50000.0);
            f.receipt = Some(ReceiptFile { file_name: "gcash.png".into(), content_type: "image/png".into(), bytes: vec![7; 32] });
            f.accept_terms = true;
            f.accept_privacy = true;
        });
        assert!(flow.validation().is_valid);

        let confirmation = flow.submit().await.unwrap();
        assert!(confirmation.booking_id.starts_with("WB-"));
        assert_eq!(confirmation.status, BookingStatus::Pending);
        assert_eq!(flow.step(), WizardStep::Success);
        assert!(device.store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_detour_after_ttl_starts_over() {
        let device = Device::new();
        let return_to = guest_enters_details(&device).await;

        device.clock.advance(Duration::minutes(6));
        device.log_in();

        let mut flow = device.open(7);
        assert_eq!(flow.resume_after_login(&return_to.to_path()).await, WizardStep::Details);
        assert_eq!(flow.wizard().form(), &BookingFormData::default());
        assert!(device.store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_never_leaks_into_other_package() {
        let device = Device::new();
        guest_enters_details(&device).await;
        device.log_in();

        let mut flow = device.open(9);
        assert_eq!(flow.resume_after_login("/packages/9/book?resume=1").await, WizardStep::Details);
        assert_eq!(flow.wizard().form().venue, "");
        assert!(device.store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signed_in_user_skips_snapshot() {
        let device = Device::new();
        device.log_in();

        let mut flow = device.open(7);
        flow.select_date("2025-12-20").unwrap();
        flow.edit(|f| f.venue = "Garden Hall".into());
        assert_eq!(flow.next().await.unwrap(), FlowOutcome::Step(WizardStep::Confirmation));
        assert!(device.store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_after_success() {
        let device = Device::new();
        device.log_in();

        let mut flow = device.open(7);
        flow.select_date("2025-12-20").unwrap();
        flow.edit(|f| f.venue = "Garden Hall".into());
        flow.next().await.unwrap();
        flow.edit(|f| {
            f.payment_method = Some(PaymentMethod::BankTransfer);
            f.payment_amount = Some(20000.0);
            f.receipt = Some(ReceiptFile { file_name: "slip.pdf".into(), content_type: "application/pdf".into(), bytes: vec![1] });
            f.accept_terms = true;
            f.accept_privacy = true;
        });
        flow.submit().await.unwrap();

        flow.reset();
        assert_eq!(flow.step(), WizardStep::Details);
        assert_eq!(flow.wizard().form(), &BookingFormData::default());
    }

    #[test]
    fn test_bad_date_from_calendar_is_rejected() {
        let device = Device::new();
        let mut flow = device.open(7);
        assert!(matches!(flow.select_date("20/12/2025"), Err(BookingError::Validation(_))));
    }
}
