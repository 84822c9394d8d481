use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::schedule::{BlockingInterval, OwnerKind};
use super::time::{TimeOfDay, TimeRange};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub service: String,
    pub staff: String,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Reservation {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// Projection read by the availability and conflict engines: one
    /// staff-owned and one customer-owned interval per committed booking.
    pub fn blocking_intervals(&self) -> [BlockingInterval; 2] {
        [
            BlockingInterval {
                date: self.date,
                range: self.range(),
                owner_kind: OwnerKind::Staff,
                owner_id: self.staff.clone(),
                reservation_id: self.id.clone(),
            },
            BlockingInterval {
                date: self.date,
                range: self.range(),
                owner_kind: OwnerKind::Customer,
                owner_id: self.customer_id.clone(),
                reservation_id: self.id.clone(),
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Confirmed,
        }
    }
}

/// In-progress booking accumulated across a Create conversation. Fields are
/// filled in order service → staff → date → time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftReservation {
    pub service: Option<String>,
    pub staff: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
}

impl DraftReservation {
    pub fn clear_staff_onward(&mut self) {
        self.staff = None;
        self.clear_date_onward();
    }

    pub fn clear_date_onward(&mut self) {
        self.date = None;
        self.clear_time();
    }

    pub fn clear_time(&mut self) {
        self.start = None;
        self.end = None;
    }
}

/// Field updates produced by a committed Modify flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModificationChanges {
    pub date: Option<NaiveDate>,
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
    pub service: Option<String>,
    pub staff: Option<String>,
}

impl ModificationChanges {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.service.is_none()
            && self.staff.is_none()
    }
}

/// `RES-YYYYMMDD-NNNN`.
pub fn is_reservation_id(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("RES-") else {
        return false;
    };
    let Some((date, seq)) = rest.split_once('-') else {
        return false;
    };
    date.len() == 8
        && seq.len() == 4
        && date.chars().all(|c| c.is_ascii_digit())
        && seq.chars().all(|c| c.is_ascii_digit())
}

pub fn format_reservation_id(date: NaiveDate, seq: u32) -> String {
    format!("RES-{}-{seq:04}", date.format("%Y%m%d"))
}
