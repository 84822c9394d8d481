use chrono::NaiveDate;

use crate::models::{BlockingInterval, OwnerKind, TimeOfDay, TimeRange};

/// Compute the maximal free sub-intervals of a day's open periods, given a
/// snapshot of committed bookings.
///
/// `staff_filter` narrows the blocking set to one staff member's bookings.
/// `exclude_reservation` drops the reservation currently being edited so
/// its own slot reads as free.
pub fn free_windows(
    date: NaiveDate,
    periods: &[TimeRange],
    blocking: &[BlockingInterval],
    staff_filter: Option<&str>,
    exclude_reservation: Option<&str>,
) -> Vec<TimeRange> {
    let mut day: Vec<&BlockingInterval> = blocking
        .iter()
        .filter(|b| b.date == date)
        .filter(|b| match staff_filter {
            Some(staff) => b.owner_kind == OwnerKind::Staff && b.owner_id == staff,
            None => true,
        })
        .filter(|b| exclude_reservation != Some(b.reservation_id.as_str()))
        .collect();
    day.sort_by_key(|b| b.range.start);

    let mut windows = Vec::new();
    for period in periods {
        let mut cursor = period.start;
        for iv in &day {
            // Outside this period entirely, or already behind the cursor.
            if iv.range.end <= cursor || iv.range.start >= period.end {
                continue;
            }
            if iv.range.start > cursor {
                windows.push(TimeRange::new(cursor, iv.range.start));
            }
            if iv.range.end > cursor {
                cursor = iv.range.end;
            }
        }
        if cursor < period.end {
            windows.push(TimeRange::new(cursor, period.end));
        }
    }
    windows
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceFit {
    pub fits: bool,
    pub adjusted_end: Option<TimeOfDay>,
}

/// Whether `window` can hold a service of `required_minutes`, and the end
/// time an over-generous selection should be trimmed down to.
pub fn fit_service(window: &TimeRange, required_minutes: i64) -> ServiceFit {
    let len = window.duration_minutes();
    if len < required_minutes {
        return ServiceFit {
            fits: false,
            adjusted_end: None,
        };
    }
    if len == required_minutes {
        return ServiceFit {
            fits: true,
            adjusted_end: Some(window.end),
        };
    }
    match window.start.add_minutes(required_minutes) {
        Some(end) => ServiceFit {
            fits: true,
            adjusted_end: Some(end),
        },
        None => ServiceFit {
            fits: false,
            adjusted_end: None,
        },
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RangeError {
    #[error("the end time must come after the start time")]
    InvertedRange,
    #[error("that range is not inside the open times for the day")]
    OutsideAvailability,
    #[error("that window is shorter than the service needs")]
    TooShort,
}

/// Validate a customer-requested range against the day's free windows,
/// trimming an over-long selection to the exact service length.
pub fn validate_user_range(
    requested: TimeRange,
    free_windows: &[TimeRange],
    required_minutes: i64,
) -> Result<TimeRange, RangeError> {
    if requested.start >= requested.end {
        return Err(RangeError::InvertedRange);
    }
    if !free_windows.iter().any(|w| w.contains(&requested)) {
        return Err(RangeError::OutsideAvailability);
    }
    let fit = fit_service(&requested, required_minutes);
    match (fit.fits, fit.adjusted_end) {
        (true, Some(end)) => Ok(TimeRange::new(requested.start, end)),
        _ => Err(RangeError::TooShort),
    }
}
