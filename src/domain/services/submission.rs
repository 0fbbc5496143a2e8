use std::sync::Arc;
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use crate::domain::models::booking::BookingConfirmation;
use crate::domain::models::booking_form::{BookingFormData, BookingSubmission};
use crate::domain::ports::{AuthContext, BookingGateway};
use crate::domain::services::recovery::PendingBookingRecovery;
use crate::domain::services::wizard::{validate_confirmation, validate_details, BookingWizard};
use crate::error::BookingError;

/// Turns validated form state into a transport payload. Fails if any required field is missing.
pub fn build_submission(package_id: i64, form: &BookingFormData) -> Result<BookingSubmission, BookingError> {
    let missing = |field: &str| BookingError::Validation(format!("Missing {}", field));

    Ok(BookingSubmission {
        package_id,
        wedding_date: form.wedding_date.ok_or_else(|| missing("wedding date"))?,
        wedding_time: form.wedding_time,
        venue: form.venue.trim().to_string(),
        special_requests: form.special_requests.trim().to_string(),
        payment_method: form.payment_method.ok_or_else(|| missing("payment method"))?,
        payment_amount: form.payment_amount.ok_or_else(|| missing("payment amount"))?,
        accept_terms: form.accept_terms,
        accept_privacy: form.accept_privacy,
        marketing_opt_in: form.marketing_opt_in,
        receipt: form.receipt.clone().ok_or_else(|| missing("payment receipt"))?,
    })
}

pub struct SubmissionPipeline {
    gateway: Arc<dyn BookingGateway>,
    recovery: Arc<PendingBookingRecovery>,
}

/// Owns the wizard while a submission is in flight. Dropped unsettled, it releases the
/// in-flight flag so an abandoned submit can be retried with the form intact.
struct InFlight<'a> {
    wizard: &'a mut BookingWizard,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(package_id = self.wizard.package_id(), "submission abandoned before it settled");
            self.wizard.release_submission();
        }
    }
}

impl SubmissionPipeline {
    pub fn new(gateway: Arc<dyn BookingGateway>, recovery: Arc<PendingBookingRecovery>) -> Self {
        Self { gateway, recovery }
    }

    /// Submits the wizard's booking. Preconditions are re-checked here rather than trusted from
    /// earlier steps. On failure or cancellation the form is left untouched so the user can retry.
    pub async fn submit(
        &self,
        wizard: &mut BookingWizard,
        auth: &dyn AuthContext,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, BookingError> {
        wizard.begin_submission()?;
        let mut in_flight = InFlight { wizard, settled: false };

        let result = self.send(&*in_flight.wizard, auth, today).await;
        in_flight.settled = true;
        let wizard = &mut *in_flight.wizard;

        match result {
            Ok(confirmation) => {
                wizard.complete(confirmation.clone())?;
                info!(
                    package_id = wizard.package_id(),
                    booking_id = %confirmation.booking_id,
                    "booking submitted"
                );
                if let Err(e) = self.recovery.clear().await {
                    warn!("could not clear pending booking after submission: {}", e);
                }
                Ok(confirmation)
            }
            Err(e) => {
                warn!(package_id = wizard.package_id(), "booking submission failed: {}", e);
                wizard.fail_submission(e.clone());
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        wizard: &BookingWizard,
        auth: &dyn AuthContext,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, BookingError> {
        let session = auth.current_user().ok_or(BookingError::AuthenticationRequired)?;

        let form = wizard.form();
        validate_details(form, today).into_result()?;
        validate_confirmation(form).into_result()?;

        let submission = build_submission(wizard.package_id(), form)?;
        self.gateway.create_booking(&session, &submission).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use crate::domain::models::booking::BookingStatus;
    use crate::domain::models::booking_form::{PaymentMethod, ReceiptFile};
    use crate::domain::models::user::{SessionUser, UserRole};
    use crate::domain::ports::PendingBookingStore;
    use crate::domain::services::recovery::PENDING_BOOKING_KEY;
    use crate::domain::services::wizard::WizardStep;
    use crate::infra::clock::ManualClock;
    use crate::infra::storage::memory_pending_store::MemoryPendingBookingStore;

    /// Replays queued results and records what was sent.
    struct ScriptedGateway {
        results: Mutex<Vec<Result<BookingConfirmation, BookingError>>>,
        sent: Mutex<Vec<BookingSubmission>>,
    }

    impl ScriptedGateway {
        fn new(results: Vec<Result<BookingConfirmation, BookingError>>) -> Self {
            Self { results: Mutex::new(results), sent: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl BookingGateway for ScriptedGateway {
        async fn create_booking(&self, _session: &SessionUser, submission: &BookingSubmission) -> Result<BookingConfirmation, BookingError> {
            self.sent.lock().unwrap().push(submission.clone());
            self.results.lock().unwrap().remove(0)
        }
    }

    /// Never answers the first request; later ones succeed.
    struct StallingGateway {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl BookingGateway for StallingGateway {
        async fn create_booking(&self, _session: &SessionUser, _submission: &BookingSubmission) -> Result<BookingConfirmation, BookingError> {
            let first = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls == 1
            };
            if first {
                std::future::pending::<()>().await;
            }
            ok()
        }
    }

    struct SignedIn(Option<SessionUser>);

    impl AuthContext for SignedIn {
        fn current_user(&self) -> Option<SessionUser> {
            self.0.clone()
        }
    }

    fn client() -> SignedIn {
        SignedIn(Some(SessionUser {
            id: "client-1".into(),
            role: UserRole::Client,
            access_token: "token".into(),
            csrf_token: "csrf".into(),
        }))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
    }

    fn ok() -> Result<BookingConfirmation, BookingError> {
        Ok(BookingConfirmation { booking_id: "WB-7H2K9Q4M1Z".into(), status: BookingStatus::Pending })
    }

    fn ready_wizard() -> BookingWizard {
        let mut w = BookingWizard::new(7);
        w.select_date(NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
        w.edit(|f| f.venue = "Garden Hall".into());
        w.advance(today(), true).unwrap();
        w.edit(|f| {
            f.payment_method = Some(PaymentMethod::Gcash);
            f.payment_amount = Some(50000.0);
            f.receipt = Some(ReceiptFile { file_name: "r.jpg".into(), content_type: "image/jpeg".into(), bytes: vec![1, 2, 3] });
            f.accept_terms = true;
            f.accept_privacy = true;
        });
        w
    }

    fn pipeline(gateway: Arc<ScriptedGateway>) -> (Arc<MemoryPendingBookingStore>, SubmissionPipeline) {
        let store = Arc::new(MemoryPendingBookingStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap()));
        let recovery = Arc::new(PendingBookingRecovery::new(store.clone(), clock, Duration::minutes(5)));
        (store, SubmissionPipeline::new(gateway, recovery))
    }

    #[tokio::test]
    async fn test_successful_submission_clears_snapshot() {
        let gateway = Arc::new(ScriptedGateway::new(vec![ok()]));
        let (store, pipeline) = pipeline(gateway.clone());
        store.set(PENDING_BOOKING_KEY, "leftover").await.unwrap();

        let mut w = ready_wizard();
        let confirmation = pipeline.submit(&mut w, &client(), today()).await.unwrap();

        assert!(confirmation.booking_id.starts_with("WB-"));
        assert_eq!(w.step(), WizardStep::Success);
        assert!(!w.is_submitting());
        assert!(store.get(PENDING_BOOKING_KEY).await.unwrap().is_none());

        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].venue, "Garden Hall");
        assert_eq!(sent[0].receipt.bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_no_resubmission_after_success() {
        let gateway = Arc::new(ScriptedGateway::new(vec![ok()]));
        let (_store, pipeline) = pipeline(gateway.clone());
        let mut w = ready_wizard();

        pipeline.submit(&mut w, &client(), today()).await.unwrap();
        assert!(pipeline.submit(&mut w, &client(), today()).await.is_err());
        assert_eq!(gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_expiry_keeps_form_for_retry() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(BookingError::SessionExpired), ok()]));
        let (_store, pipeline) = pipeline(gateway);
        let mut w = ready_wizard();

        let err = pipeline.submit(&mut w, &client(), today()).await.unwrap_err();
        assert_eq!(err, BookingError::SessionExpired);
        assert_eq!(w.step(), WizardStep::Confirmation);
        assert_eq!(w.active_error(), Some(&BookingError::SessionExpired));
        assert!(w.form().has_receipt());
        assert!(!w.is_submitting());

        pipeline.submit(&mut w, &client(), today()).await.unwrap();
        assert_eq!(w.step(), WizardStep::Success);
    }

    #[tokio::test]
    async fn test_cancelled_submission_can_be_retried() {
        let gateway = Arc::new(StallingGateway { calls: Mutex::new(0) });
        let store = Arc::new(MemoryPendingBookingStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap()));
        let recovery = Arc::new(PendingBookingRecovery::new(store, clock, Duration::minutes(5)));
        let pipeline = SubmissionPipeline::new(gateway.clone(), recovery);
        let mut w = ready_wizard();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            pipeline.submit(&mut w, &client(), today()),
        ).await;
        assert!(timed_out.is_err());
        assert!(!w.is_submitting());
        assert_eq!(w.step(), WizardStep::Confirmation);
        assert!(w.form().has_receipt());

        let confirmation = pipeline.submit(&mut w, &client(), today()).await.unwrap();
        assert!(confirmation.booking_id.starts_with("WB-"));
        assert_eq!(w.step(), WizardStep::Success);
        assert_eq!(*gateway.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_retryable() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(BookingError::Transport("502".into()))]));
        let (_store, pipeline) = pipeline(gateway);
        let mut w = ready_wizard();

        let err = pipeline.submit(&mut w, &client(), today()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(w.form().venue, "Garden Hall");
    }

    #[tokio::test]
    async fn test_preconditions_are_rechecked() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let (_store, pipeline) = pipeline(gateway.clone());

        let mut w = ready_wizard();
        let err = pipeline.submit(&mut w, &SignedIn(None), today()).await.unwrap_err();
        assert_eq!(err, BookingError::AuthenticationRequired);

        w.edit(|f| f.accept_terms = false);
        let err = pipeline.submit(&mut w, &client(), today()).await.unwrap_err();
        assert_eq!(err, BookingError::Validation("Please accept the terms and conditions".into()));

        // The wedding date became today while the guest was paying.
        w.edit(|f| f.accept_terms = true);
        let late = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let err = pipeline.submit(&mut w, &client(), late).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        assert!(gateway.sent.lock().unwrap().is_empty());
    }
}
