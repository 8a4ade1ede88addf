//! Service-calendar window filtering.
//!
//! Old service periods linger in the published feed long after they stop
//! mattering. A service id is "useful" when it has at least one active day
//! inside the lookahead window: weekday flags bounded by the calendar's date
//! range, then per-day calendar exceptions (added days turn on, removed days
//! turn off). Trips on other service ids are excluded before normalization.

use chrono::{Datelike, Days, NaiveDate};
use citla_model::{Calendar, CalendarDate, ExceptionType};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ServiceWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl ServiceWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).filter_map(|offset| self.start.checked_add_days(Days::new(offset as u64)))
    }

    fn contains(&self, date: NaiveDate) -> bool {
        if date < self.start {
            return false;
        }
        match self.start.checked_add_days(Days::new(self.days as u64)) {
            Some(end) => date < end,
            None => true,
        }
    }
}

pub fn useful_service_ids(
    calendars: &[Calendar],
    calendar_dates: &[CalendarDate],
    window: &ServiceWindow,
) -> FxHashSet<String> {
    let mut exceptions: FxHashMap<&str, FxHashMap<NaiveDate, ExceptionType>> =
        FxHashMap::default();
    for calendar_date in calendar_dates {
        if let Some(date) = calendar_date.date.to_naive_date() {
            exceptions
                .entry(calendar_date.service_id.as_str())
                .or_default()
                .insert(date, calendar_date.exception_type);
        }
    }

    let mut useful = FxHashSet::default();
    for calendar in calendars {
        let (Some(start), Some(end)) = (
            calendar.start_date.to_naive_date(),
            calendar.end_date.to_naive_date(),
        ) else {
            continue;
        };
        let removed_on = exceptions.get(calendar.service_id.as_str());
        let active = window.dates().any(|date| {
            if removed_on.and_then(|days| days.get(&date)) == Some(&ExceptionType::Removed) {
                return false;
            }
            date >= start && date <= end && calendar.weekday(date.weekday()).is_available()
        });
        if active {
            useful.insert(calendar.service_id.clone());
        }
    }

    // Added days count even for services with no calendar row at all.
    for calendar_date in calendar_dates {
        if calendar_date.exception_type != ExceptionType::Added {
            continue;
        }
        if let Some(date) = calendar_date.date.to_naive_date() {
            if window.contains(date) {
                useful.insert(calendar_date.service_id.clone());
            }
        }
    }

    debug!(
        services = useful.len(),
        start = %window.start,
        days = window.days,
        "computed useful service ids"
    );
    useful
}
