use std::collections::BTreeMap;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use crate::domain::models::availability::DateAvailability;
use crate::error::BookingError;

/// Share of remaining slots at or below which a date is shown as "limited".
pub const LIMITED_THRESHOLD: f64 = 0.2;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Past,
    Today,
    Available,
    Limited,
    Full,
    Preparation,
    Blocked,
}

impl CellStatus {
    pub fn is_selectable(&self) -> bool {
        matches!(self, CellStatus::Available | CellStatus::Limited)
    }
}

/// Exactly one status per date. The temporal gate wins, then preparation, then blackout, then capacity.
pub fn classify(date: NaiveDate, today: NaiveDate, availability: Option<&DateAvailability>) -> CellStatus {
    if date < today {
        return CellStatus::Past;
    }
    if date == today {
        return CellStatus::Today;
    }

    let Some(a) = availability else {
        return CellStatus::Blocked;
    };

    if a.is_preparation_period {
        CellStatus::Preparation
    } else if a.is_blocked {
        CellStatus::Blocked
    } else if a.available_slots <= 0 {
        CellStatus::Full
    } else if a.remaining_ratio() <= LIMITED_THRESHOLD {
        CellStatus::Limited
    } else {
        CellStatus::Available
    }
}

pub fn tooltip(status: CellStatus, availability: Option<&DateAvailability>) -> String {
    let reason = availability.and_then(|a| a.reason.clone());
    match status {
        CellStatus::Past => "This date has already passed".to_string(),
        CellStatus::Today => "Same-day bookings are not accepted".to_string(),
        CellStatus::Preparation => reason.unwrap_or_else(|| "The planner is preparing for another wedding".to_string()),
        CellStatus::Blocked => reason.unwrap_or_else(|| "Not available on this date".to_string()),
        CellStatus::Full => "Fully booked".to_string(),
        CellStatus::Limited => match availability {
            Some(a) => format!("Only {} of {} slots left", a.available_slots, a.total_slots),
            None => "Few slots left".to_string(),
        },
        CellStatus::Available => match availability.map(|a| a.available_slots) {
            Some(1) => "1 slot available".to_string(),
            Some(n) => format!("{} slots available", n),
            None => "Available".to_string(),
        },
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub day: u32,
    pub in_month: bool,
    pub status: CellStatus,
    pub available_slots: Option<i32>,
    pub total_slots: Option<i32>,
    pub tooltip: String,
}

impl CalendarCell {
    pub fn new(date: NaiveDate, in_month: bool, today: NaiveDate, availability: Option<&DateAvailability>) -> Self {
        let status = classify(date, today, availability);
        Self {
            date,
            day: date.day(),
            in_month,
            status,
            available_slots: availability.map(|a| a.available_slots),
            total_slots: availability.map(|a| a.total_slots),
            tooltip: tooltip(status, availability),
        }
    }

    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Selected(String),
    Rejected { reason: String },
}

/// Sunday-first month grid; leading and trailing cells belong to neighbouring months.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<CalendarCell>>,
}

impl CalendarMonth {
    pub fn build(
        year: i32,
        month: u32,
        today: NaiveDate,
        availability: &BTreeMap<NaiveDate, DateAvailability>,
    ) -> Result<Self, BookingError> {
        let (grid_start, grid_end) = grid_bounds(year, month)?;

        let mut weeks = Vec::new();
        let mut week = Vec::with_capacity(7);
        let mut current = grid_start;
        while current <= grid_end {
            let in_month = current.year() == year && current.month() == month;
            week.push(CalendarCell::new(current, in_month, today, availability.get(&current)));
            if week.len() == 7 {
                weeks.push(std::mem::replace(&mut week, Vec::with_capacity(7)));
            }
            current = next_day(current)?;
        }

        Ok(Self { year, month, weeks })
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.weeks.iter().flatten().find(|c| c.date == date)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }
}

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), BookingError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| BookingError::Validation(format!("Invalid month {}-{}", year, month)))?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| BookingError::Validation(format!("Invalid month {}-{}", year, month)))?;
    Ok((first, last))
}

/// First and last date shown in the month's grid, padded to whole weeks.
pub fn grid_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), BookingError> {
    let (first, last) = month_bounds(year, month)?;
    let lead = first.weekday().num_days_from_sunday() as u64;
    let trail = 6 - last.weekday().num_days_from_sunday() as u64;

    let start = first.checked_sub_days(Days::new(lead)).unwrap_or(first);
    let end = last.checked_add_days(Days::new(trail)).unwrap_or(last);
    Ok((start, end))
}

/// Range to fetch for a month view: the whole grid, extended far enough to show preparation spillover.
pub fn fetch_range(year: i32, month: u32, preparation_days: i32) -> Result<(NaiveDate, NaiveDate), BookingError> {
    let (_, last) = month_bounds(year, month)?;
    let (grid_start, grid_end) = grid_bounds(year, month)?;
    let spill = last.checked_add_days(Days::new(preparation_days.max(0) as u64)).unwrap_or(last);
    Ok((grid_start, grid_end.max(spill)))
}

pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, BookingError> {
    date.succ_opt().ok_or_else(|| BookingError::Validation("Date is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn avail(date: NaiveDate, total: i32, booked: i32) -> DateAvailability {
        let mut a = DateAvailability::open(date, total);
        a.booked_slots = booked;
        a.available_slots = total - booked;
        a.available = a.available_slots > 0;
        a
    }

    #[test]
    fn test_temporal_gate_wins_over_capacity() {
        let today = d(2025, 6, 15);
        let open = avail(today, 5, 0);
        assert_eq!(classify(today, today, Some(&open)), CellStatus::Today);
        assert_eq!(classify(d(2025, 6, 14), today, Some(&avail(d(2025, 6, 14), 5, 0))), CellStatus::Past);
    }

    #[test]
    fn test_classification_precedence() {
        let today = d(2025, 6, 1);
        let date = d(2025, 6, 10);

        let mut prep = avail(date, 5, 0);
        prep.is_blocked = true;
        prep.is_preparation_period = true;
        assert_eq!(classify(date, today, Some(&prep)), CellStatus::Preparation);

        let mut blocked = avail(date, 5, 0);
        blocked.is_blocked = true;
        assert_eq!(classify(date, today, Some(&blocked)), CellStatus::Blocked);

        assert_eq!(classify(date, today, Some(&avail(date, 5, 5))), CellStatus::Full);
        assert_eq!(classify(date, today, Some(&avail(date, 5, 4))), CellStatus::Limited);
        assert_eq!(classify(date, today, Some(&avail(date, 10, 7))), CellStatus::Available);
        assert_eq!(classify(date, today, Some(&avail(date, 1, 0))), CellStatus::Available);
        assert_eq!(classify(date, today, None), CellStatus::Blocked);
    }

    #[test]
    fn test_month_grid_is_padded_to_whole_weeks() {
        // February 2026 starts on a Sunday and ends on a Saturday.
        let month = CalendarMonth::build(2026, 2, d(2026, 1, 1), &BTreeMap::new()).unwrap();
        assert_eq!(month.weeks.len(), 4);
        assert!(month.cells().all(|c| c.in_month));

        // December 2025 starts on a Monday.
        let month = CalendarMonth::build(2025, 12, d(2025, 1, 1), &BTreeMap::new()).unwrap();
        assert!(month.weeks.iter().all(|w| w.len() == 7));
        let first = &month.weeks[0][0];
        assert_eq!(first.date, d(2025, 11, 30));
        assert!(!first.in_month);
        let last = month.weeks.last().unwrap().last().unwrap();
        assert_eq!(last.date, d(2026, 1, 3));
    }

    #[test]
    fn test_fetch_range_covers_preparation_spillover() {
        let (start, end) = fetch_range(2025, 12, 10).unwrap();
        assert_eq!(start, d(2025, 11, 30));
        assert_eq!(end, d(2026, 1, 10));

        let (_, end) = fetch_range(2025, 12, 0).unwrap();
        assert_eq!(end, d(2026, 1, 3));
    }

    #[test]
    fn test_shift_month_wraps_years() {
        assert_eq!(shift_month(2025, 12, 1), (2026, 1));
        assert_eq!(shift_month(2025, 1, -1), (2024, 12));
        assert_eq!(shift_month(2025, 6, 0), (2025, 6));
    }

    #[test]
    fn test_tooltips_explain_ineligible_cells() {
        let date = d(2025, 6, 10);
        let mut blocked = avail(date, 2, 0);
        blocked.is_blocked = true;
        blocked.reason = Some("Planner on leave".into());

        assert_eq!(tooltip(CellStatus::Blocked, Some(&blocked)), "Planner on leave");
        assert_eq!(tooltip(CellStatus::Today, None), "Same-day bookings are not accepted");
        assert_eq!(tooltip(CellStatus::Limited, Some(&avail(date, 5, 4))), "Only 1 of 5 slots left");
    }
}
