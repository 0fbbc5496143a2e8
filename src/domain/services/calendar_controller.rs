use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, warn};
use crate::domain::models::availability::DateAvailability;
use crate::domain::ports::{AvailabilitySource, Clock};
use crate::domain::services::calendar::{classify, fetch_range, shift_month, tooltip, CalendarMonth, ClickOutcome};
use crate::error::BookingError;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthRequest {
    pub seq: u64,
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug)]
pub struct MonthResponse {
    pub request: MonthRequest,
    pub result: Result<BTreeMap<NaiveDate, DateAvailability>, BookingError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub seq: u64,
    pub date: NaiveDate,
}

#[derive(Debug)]
pub struct DetailResponse {
    pub request: DetailRequest,
    pub result: Result<DateAvailability, BookingError>,
}

pub async fn fetch_month(source: &dyn AvailabilitySource, package_id: i64, request: MonthRequest) -> MonthResponse {
    let result = source.get_availability_range(package_id, request.start, request.end).await;
    MonthResponse { request, result }
}

pub async fn fetch_detail(source: &dyn AvailabilitySource, package_id: i64, request: DetailRequest) -> DetailResponse {
    let result = source.get_availability(package_id, request.date).await;
    DetailResponse { request, result }
}

/// Month navigation and date selection for one package's booking calendar.
///
/// Month fetches and selection-detail fetches are sequenced independently; a response is only
/// applied if it answers the most recent request of its kind.
pub struct CalendarController {
    package_id: i64,
    source: Arc<dyn AvailabilitySource>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    preparation_days: Option<i32>,
    visible: (i32, u32),
    month_seq: u64,
    month: Option<CalendarMonth>,
    loading: bool,
    error: Option<BookingError>,
    selected: Option<NaiveDate>,
    detail_seq: u64,
    detail: Option<DateAvailability>,
    notice: Option<String>,
}

impl CalendarController {
    pub fn new(package_id: i64, source: Arc<dyn AvailabilitySource>, clock: Arc<dyn Clock>, timezone: Tz) -> Self {
        let today = clock.now().with_timezone(&timezone).date_naive();
        Self {
            package_id,
            source,
            clock,
            timezone,
            preparation_days: None,
            visible: (today.year(), today.month()),
            month_seq: 0,
            month: None,
            loading: false,
            error: None,
            selected: None,
            detail_seq: 0,
            detail: None,
            notice: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    pub fn visible_month(&self) -> (i32, u32) {
        self.visible
    }

    pub fn month(&self) -> Option<&CalendarMonth> {
        self.month.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&BookingError> {
        self.error.as_ref()
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn selected_detail(&self) -> Option<&DateAvailability> {
        self.detail.as_ref()
    }

    /// Reason shown for the last rejected click, cleared by the next successful one.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Cached after the first success. A failure is retried on the next month load.
    async fn ensure_preparation_days(&mut self) -> Result<i32, BookingError> {
        if let Some(days) = self.preparation_days {
            return Ok(days);
        }
        let days = self.source.get_preparation_days(self.package_id).await?;
        self.preparation_days = Some(days);
        Ok(days)
    }

    pub fn begin_month(&mut self, year: i32, month: u32) -> Result<MonthRequest, BookingError> {
        let (start, end) = fetch_range(year, month, self.preparation_days.unwrap_or(0))?;
        self.month_seq += 1;
        self.visible = (year, month);
        self.loading = true;
        Ok(MonthRequest { seq: self.month_seq, year, month, start, end })
    }

    pub fn apply_month(&mut self, response: MonthResponse) -> Result<(), BookingError> {
        let request = response.request;
        if request.seq != self.month_seq || (request.year, request.month) != self.visible {
            debug!(seq = request.seq, latest = self.month_seq, "dropping stale month response");
            return Err(BookingError::StaleDataDiscarded);
        }

        self.loading = false;
        match response.result {
            Ok(availability) => {
                let today = self.today();
                self.month = Some(CalendarMonth::build(request.year, request.month, today, &availability)?);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Loads and applies a month. Without preparation days the month is still shown, but
    /// `error()` reports that earlier bookings' spillover may be missing.
    pub async fn show_month(&mut self, year: i32, month: u32) -> Result<(), BookingError> {
        let preparation = self.ensure_preparation_days().await;
        let request = self.begin_month(year, month)?;
        let response = fetch_month(self.source.as_ref(), self.package_id, request).await;
        self.apply_month(response)?;

        if let Err(e) = preparation {
            warn!(package_id = self.package_id, "month shown without preparation days: {}", e);
            self.error = Some(e);
        }
        Ok(())
    }

    pub async fn next_month(&mut self) -> Result<(), BookingError> {
        let (year, month) = shift_month(self.visible.0, self.visible.1, 1);
        self.show_month(year, month).await
    }

    pub async fn previous_month(&mut self) -> Result<(), BookingError> {
        let (year, month) = shift_month(self.visible.0, self.visible.1, -1);
        self.show_month(year, month).await
    }

    /// Handles a click on a date cell. `on_select` runs only for an eligible date.
    pub fn click<F: FnOnce(&str)>(&mut self, date: NaiveDate, on_select: F) -> ClickOutcome {
        let today = self.today();
        // Cells keep the day they were built on; past and same-day are re-checked against now.
        let (status, reason) = match self.month.as_ref().and_then(|m| m.cell(date)) {
            Some(cell) if date > today => (cell.status, cell.tooltip.clone()),
            _ => {
                let status = classify(date, today, None);
                (status, tooltip(status, None))
            }
        };

        if !status.is_selectable() {
            self.notice = Some(reason.clone());
            return ClickOutcome::Rejected { reason };
        }

        let iso = date.format("%Y-%m-%d").to_string();
        self.notice = None;
        if self.selected != Some(date) {
            self.detail = None;
        }
        self.selected = Some(date);
        on_select(&iso);
        ClickOutcome::Selected(iso)
    }

    pub fn begin_detail(&mut self) -> Option<DetailRequest> {
        let date = self.selected?;
        self.detail_seq += 1;
        Some(DetailRequest { seq: self.detail_seq, date })
    }

    pub fn apply_detail(&mut self, response: DetailResponse) -> Result<(), BookingError> {
        if response.request.seq != self.detail_seq || Some(response.request.date) != self.selected {
            return Err(BookingError::StaleDataDiscarded);
        }
        self.detail = Some(response.result?);
        Ok(())
    }

    /// Click followed by the single-date detail fetch for the summary panel.
    pub async fn select<F: FnOnce(&str)>(&mut self, date: NaiveDate, on_select: F) -> Result<ClickOutcome, BookingError> {
        let outcome = self.click(date, on_select);
        if let ClickOutcome::Selected(_) = outcome
            && let Some(request) = self.begin_detail() {
            let response = fetch_detail(self.source.as_ref(), self.package_id, request).await;
            self.apply_detail(response)?;
        }
        Ok(outcome)
    }
}
