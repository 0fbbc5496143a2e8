use chrono::{Days, NaiveDate};
use crate::domain::models::availability::DateAvailability;
use crate::domain::models::booking::Booking;
use crate::domain::models::package::Package;
use crate::domain::models::package_override::PackageOverride;
use crate::error::BookingError;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Longest range a single availability query may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

const DEFAULT_BLOCKED_REASON: &str = "Not available on this date";

/// What wins when a wedding date also falls inside another booking's preparation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The date stays bookable while it has numeric capacity left.
    #[default]
    CapacityFirst,
    /// Preparation blocks the date outright.
    PreparationFirst,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capacity_first" => Ok(OverlapPolicy::CapacityFirst),
            "preparation_first" => Ok(OverlapPolicy::PreparationFirst),
            other => Err(format!("unknown overlap policy '{}'", other)),
        }
    }
}

/// Pure per-date capacity computation for one package. Has no notion of "now".
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityResolver {
    policy: OverlapPolicy,
}

impl AvailabilityResolver {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    pub fn resolve_date(
        &self,
        package: &Package,
        date: NaiveDate,
        bookings: &[Booking],
        overrides: &[PackageOverride],
    ) -> Result<DateAvailability, BookingError> {
        let mut resolved = self.resolve_range(package, date, date, bookings, overrides)?;
        resolved.remove(&date)
            .ok_or_else(|| BookingError::Configuration(format!("no availability computed for {}", date)))
    }

    /// One entry per date in the inclusive `[start, end]`, including dates with no bookings.
    pub fn resolve_range(
        &self,
        package: &Package,
        start: NaiveDate,
        end: NaiveDate,
        bookings: &[Booking],
        overrides: &[PackageOverride],
    ) -> Result<BTreeMap<NaiveDate, DateAvailability>, BookingError> {
        package.validate()?;

        if start > end {
            return Err(BookingError::Validation("Start date must not be after end date".into()));
        }
        if (end - start).num_days() >= MAX_RANGE_DAYS {
            return Err(BookingError::Validation(format!("Range may span at most {} days", MAX_RANGE_DAYS)));
        }

        let mut booked_per_date: BTreeMap<NaiveDate, i32> = BTreeMap::new();
        for booking in bookings.iter().filter(|b| b.package_id == package.id && b.occupies_slot()) {
            *booked_per_date.entry(booking.wedding_date).or_insert(0) += 1;
        }

        let preparation = preparation_dates(&booked_per_date, package.preparation_days, start, end);

        let overrides_by_date: BTreeMap<NaiveDate, &PackageOverride> = overrides.iter()
            .filter(|o| o.package_id == package.id)
            .map(|o| (o.date, o))
            .collect();

        let mut result = BTreeMap::new();
        let mut current = start;
        loop {
            let entry = self.resolve_one(
                package,
                current,
                booked_per_date.get(&current).copied().unwrap_or(0),
                preparation.get(&current).copied(),
                overrides_by_date.get(&current).copied(),
            )?;
            result.insert(current, entry);

            if current == end {
                break;
            }
            current = current.checked_add_days(Days::new(1))
                .ok_or_else(|| BookingError::Validation("Date range exceeds the calendar".into()))?;
        }

        Ok(result)
    }

    fn resolve_one(
        &self,
        package: &Package,
        date: NaiveDate,
        booked: i32,
        preparation_source: Option<NaiveDate>,
        override_rule: Option<&PackageOverride>,
    ) -> Result<DateAvailability, BookingError> {
        let total_slots = match override_rule.and_then(|o| o.override_slots) {
            Some(slots) if slots < 0 => {
                return Err(BookingError::Configuration(format!(
                    "package {} has a negative slot override ({}) on {}",
                    package.id, slots, date
                )));
            }
            Some(slots) => slots,
            None => package.default_slots,
        };

        let booked_slots = booked.clamp(0, total_slots);
        let available_slots = (total_slots - booked_slots).max(0);

        let mut entry = DateAvailability::open(date, total_slots);
        entry.booked_slots = booked_slots;
        entry.available_slots = available_slots;

        if let Some(rule) = override_rule
            && rule.is_blocked {
            entry.is_blocked = true;
            entry.reason = Some(rule.reason.clone().unwrap_or_else(|| DEFAULT_BLOCKED_REASON.to_string()));
        }

        if let Some(source) = preparation_source {
            let is_wedding_date = booked > 0;
            let blocks = match self.policy {
                OverlapPolicy::PreparationFirst => true,
                OverlapPolicy::CapacityFirst => !is_wedding_date || available_slots == 0,
            };
            if blocks {
                entry.is_blocked = true;
                entry.is_preparation_period = true;
                entry.reason = Some(format!("Preparation period after the wedding on {}", source));
            }
        }

        entry.available = entry.available_slots > 0 && !entry.is_blocked;
        Ok(entry)
    }
}

/// Dates in `(D, D + days]` for every booked date D, clipped to `[start, end]` and mapped to the
/// earliest D that covers them.
fn preparation_dates(
    booked_per_date: &BTreeMap<NaiveDate, i32>,
    days: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, NaiveDate> {
    let mut blocked = BTreeMap::new();
    if days <= 0 {
        return blocked;
    }

    for &wedding_date in booked_per_date.range(..end).map(|(d, _)| d) {
        let Some(first) = wedding_date.succ_opt() else { continue };
        let first = first.max(start);
        let last = wedding_date.checked_add_days(Days::new(days as u64)).map_or(end, |d| d.min(end));

        let mut current = first;
        while current <= last {
            blocked.entry(current).or_insert(wedding_date);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
    }
    blocked
}

/// First `limit` bookable dates of an already resolved range.
pub fn upcoming_available(
    resolved: &BTreeMap<NaiveDate, DateAvailability>,
    limit: usize,
) -> Vec<DateAvailability> {
    resolved.values()
        .filter(|a| a.available)
        .take(limit)
        .cloned()
        .collect()
}
