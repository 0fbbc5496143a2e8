use std::fmt;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use crate::domain::models::booking::BookingConfirmation;
use crate::domain::models::booking_form::BookingFormData;
use crate::error::BookingError;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Details,
    Confirmation,
    Success,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Details => "details",
            WizardStep::Confirmation => "confirmation",
            WizardStep::Success => "success",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed step changes. Leaving `Success` is only possible through `BookingWizard::reset`.
const TRANSITIONS: &[(WizardStep, WizardStep)] = &[
    (WizardStep::Details, WizardStep::Confirmation),
    (WizardStep::Confirmation, WizardStep::Details),
    (WizardStep::Confirmation, WizardStep::Success),
];

pub fn check_transition(from: WizardStep, to: WizardStep) -> Result<(), BookingError> {
    if TRANSITIONS.contains(&(from, to)) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from: from.to_string(), to: to.to_string() })
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StepValidation {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl StepValidation {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        Self { is_valid: errors.is_empty(), errors }
    }

    pub fn valid() -> Self {
        Self::from_errors(Vec::new())
    }

    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn into_result(self) -> Result<(), BookingError> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(e) => Err(BookingError::Validation(e.message)),
        }
    }
}

fn field_error(field: &'static str, message: &str) -> FieldError {
    FieldError { field, message: message.to_string() }
}

pub fn validate_details(form: &BookingFormData, today: NaiveDate) -> StepValidation {
    let mut errors = Vec::new();

    match form.wedding_date {
        None => errors.push(field_error("wedding_date", "Please select a wedding date")),
        Some(date) if date <= today => {
            errors.push(field_error("wedding_date", "Wedding date must be after today"))
        }
        Some(_) => {}
    }

    if form.venue.trim().is_empty() {
        errors.push(field_error("venue", "Please enter the wedding venue"));
    }

    StepValidation::from_errors(errors)
}

pub fn validate_confirmation(form: &BookingFormData) -> StepValidation {
    let mut errors = Vec::new();

    if form.payment_method.is_none() {
        errors.push(field_error("payment_method", "Please select a payment method"));
    }
    if !form.payment_amount.is_some_and(|a| a.is_finite() && a > 0.0) {
        errors.push(field_error("payment_amount", "Payment amount must be greater than zero"));
    }
    if !form.has_receipt() {
        errors.push(field_error("receipt", "Please upload your payment receipt"));
    }
    if !form.accept_terms {
        errors.push(field_error("accept_terms", "Please accept the terms and conditions"));
    }
    if !form.accept_privacy {
        errors.push(field_error("accept_privacy", "Please accept the privacy policy"));
    }

    StepValidation::from_errors(errors)
}

/// Multi-step booking form state for a single package.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    package_id: i64,
    step: WizardStep,
    form: BookingFormData,
    active_error: Option<BookingError>,
    show_field_errors: bool,
    submitting: bool,
    confirmation: Option<BookingConfirmation>,
}

impl BookingWizard {
    pub fn new(package_id: i64) -> Self {
        Self {
            package_id,
            step: WizardStep::Details,
            form: BookingFormData::default(),
            active_error: None,
            show_field_errors: false,
            submitting: false,
            confirmation: None,
        }
    }

    pub fn package_id(&self) -> i64 {
        self.package_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &BookingFormData {
        &self.form
    }

    pub fn active_error(&self) -> Option<&BookingError> {
        self.active_error.as_ref()
    }

    pub fn show_field_errors(&self) -> bool {
        self.show_field_errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    /// Validation of the current step against the current form.
    pub fn validation(&self, today: NaiveDate) -> StepValidation {
        match self.step {
            WizardStep::Details => validate_details(&self.form, today),
            WizardStep::Confirmation => validate_confirmation(&self.form),
            WizardStep::Success => StepValidation::valid(),
        }
    }

    /// Applies a user edit. Any user action clears the active error.
    pub fn edit<F: FnOnce(&mut BookingFormData)>(&mut self, apply: F) {
        if self.step == WizardStep::Success {
            debug!(package_id = self.package_id, "ignoring edit after successful booking");
            return;
        }
        apply(&mut self.form);
        self.active_error = None;
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.edit(|form| form.wedding_date = Some(date));
    }

    pub fn set_error(&mut self, err: BookingError) {
        if matches!(err, BookingError::Validation(_)) {
            self.show_field_errors = true;
        }
        self.active_error = Some(err);
    }

    fn move_to(&mut self, to: WizardStep) -> Result<(), BookingError> {
        check_transition(self.step, to)?;
        debug!(package_id = self.package_id, "wizard {} -> {}", self.step, to);
        self.step = to;
        self.show_field_errors = false;
        Ok(())
    }

    /// Attempts to leave `Details`. Returns `AuthenticationRequired` when the details are valid
    /// but the guest still has to sign in; the caller owns the detour.
    pub fn advance(&mut self, today: NaiveDate, authenticated: bool) -> Result<WizardStep, BookingError> {
        if self.step != WizardStep::Details {
            let next = match self.step {
                WizardStep::Confirmation => WizardStep::Success,
                _ => WizardStep::Details,
            };
            let err = BookingError::InvalidTransition { from: self.step.to_string(), to: next.to_string() };
            return Err(err);
        }

        if let Err(e) = validate_details(&self.form, today).into_result() {
            self.set_error(e.clone());
            return Err(e);
        }
        if !authenticated {
            return Err(BookingError::AuthenticationRequired);
        }

        self.active_error = None;
        self.move_to(WizardStep::Confirmation)?;
        Ok(self.step)
    }

    /// Back to `Details`, keeping every field entered so far.
    pub fn back(&mut self) -> Result<WizardStep, BookingError> {
        self.move_to(WizardStep::Details)?;
        self.active_error = None;
        Ok(self.step)
    }

    /// Puts a recovered form back into a fresh wizard. Lands on `Confirmation` when the recovered
    /// details still validate, otherwise on `Details`.
    pub fn restore(&mut self, form: BookingFormData, today: NaiveDate) -> Result<WizardStep, BookingError> {
        if self.step != WizardStep::Details {
            return Err(BookingError::InvalidTransition {
                from: self.step.to_string(),
                to: WizardStep::Confirmation.to_string(),
            });
        }

        self.form = form.without_receipt();
        self.active_error = None;
        if validate_details(&self.form, today).is_valid {
            self.move_to(WizardStep::Confirmation)?;
        }
        Ok(self.step)
    }

    /// Sets the in-flight flag. Only one submission may be outstanding.
    pub fn begin_submission(&mut self) -> Result<(), BookingError> {
        if self.submitting {
            return Err(BookingError::SubmissionInProgress);
        }
        check_transition(self.step, WizardStep::Success)?;
        self.submitting = true;
        self.active_error = None;
        Ok(())
    }

    /// Drops the in-flight flag without recording an outcome.
    pub fn release_submission(&mut self) {
        self.submitting = false;
    }

    pub fn fail_submission(&mut self, err: BookingError) {
        self.submitting = false;
        self.set_error(err);
    }

    pub fn complete(&mut self, confirmation: BookingConfirmation) -> Result<(), BookingError> {
        self.submitting = false;
        validate_confirmation(&self.form).into_result()?;
        self.move_to(WizardStep::Success)?;
        self.confirmation = Some(confirmation);
        Ok(())
    }

    /// Explicit exit from any step back to an empty `Details` step.
    pub fn reset(&mut self) {
        *self = Self::new(self.package_id);
    }
}
