use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::time::{TimeOfDay, TimeRange};

const DAY_ORDER: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlot {
    pub day: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Weekly business-hours template. A day may carry several open periods
/// separated by closures (e.g. a lunch break); each day's periods must be
/// non-overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub slots: Vec<OpenSlot>,
}

impl BusinessHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: BusinessHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for slot in &self.slots {
            parse_weekday(&slot.day)?;
            anyhow::ensure!(
                slot.start < slot.end,
                "open period must start before it ends: {} {}~{}",
                slot.day,
                slot.start,
                slot.end
            );
        }
        for day in DAY_ORDER {
            let periods = self.periods_for_day(day);
            for pair in periods.windows(2) {
                anyhow::ensure!(
                    pair[0].end <= pair[1].start,
                    "overlapping open periods on {day}: {} and {}",
                    pair[0],
                    pair[1]
                );
            }
        }
        Ok(())
    }

    fn periods_for_day(&self, day: &str) -> Vec<TimeRange> {
        let mut periods: Vec<TimeRange> = self
            .slots
            .iter()
            .filter(|s| s.day.eq_ignore_ascii_case(day))
            .map(|s| TimeRange::new(s.start, s.end))
            .collect();
        periods.sort_by_key(|p| p.start);
        periods
    }

    /// Ordered open periods for a calendar date. Empty means closed that day.
    pub fn periods_for(&self, date: NaiveDate) -> Vec<TimeRange> {
        self.periods_for_day(weekday_key(date.weekday()))
    }

    pub fn to_human_readable(&self) -> String {
        if self.slots.is_empty() {
            return String::new();
        }

        let mut sorted = self.slots.clone();
        sorted.sort_by_key(|s| {
            let day_idx = DAY_ORDER
                .iter()
                .position(|d| s.day.eq_ignore_ascii_case(d))
                .unwrap_or(7);
            (day_idx, s.start)
        });

        sorted
            .iter()
            .map(|s| format!("{} {}~{}", capitalize(&s.day), s.start, s.end))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    if DAY_ORDER.iter().any(|d| s.eq_ignore_ascii_case(d)) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("invalid weekday: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Staff,
    Customer,
}

/// One committed reservation's occupied time, as seen by the availability
/// and conflict engines. The directory projects each reservation into a
/// staff-owned and a customer-owned interval; the engines only read these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingInterval {
    pub date: NaiveDate,
    pub range: TimeRange,
    pub owner_kind: OwnerKind,
    pub owner_id: String,
    pub reservation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_from_json_valid() {
        let json = r#"{"slots":[
            {"day":"mon","start":"09:00","end":"12:00"},
            {"day":"mon","start":"13:00","end":"18:00"},
            {"day":"tue","start":"09:00","end":"18:00"}
        ]}"#;
        let hours = BusinessHours::from_json(json).unwrap();
        assert_eq!(hours.slots.len(), 3);
    }

    #[test]
    fn test_from_json_rejects_bad_day() {
        let json = r#"{"slots":[{"day":"xyz","start":"09:00","end":"12:00"}]}"#;
        assert!(BusinessHours::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_inverted_period() {
        let json = r#"{"slots":[{"day":"mon","start":"12:00","end":"09:00"}]}"#;
        assert!(BusinessHours::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_rejects_overlapping_periods() {
        let json = r#"{"slots":[
            {"day":"mon","start":"09:00","end":"13:00"},
            {"day":"mon","start":"12:00","end":"18:00"}
        ]}"#;
        assert!(BusinessHours::from_json(json).is_err());
    }

    #[test]
    fn test_periods_for_sorted_and_scoped_to_day() {
        let json = r#"{"slots":[
            {"day":"mon","start":"13:00","end":"18:00"},
            {"day":"mon","start":"09:00","end":"12:00"},
            {"day":"tue","start":"10:00","end":"16:00"}
        ]}"#;
        let hours = BusinessHours::from_json(json).unwrap();

        // 2025-01-13 is a Monday
        let periods = hours.periods_for(d("2025-01-13"));
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].to_string(), "09:00~12:00");
        assert_eq!(periods[1].to_string(), "13:00~18:00");
    }

    #[test]
    fn test_periods_for_closed_day() {
        let json = r#"{"slots":[{"day":"mon","start":"09:00","end":"12:00"}]}"#;
        let hours = BusinessHours::from_json(json).unwrap();
        // 2025-01-12 is a Sunday
        assert!(hours.periods_for(d("2025-01-12")).is_empty());
    }

    #[test]
    fn test_to_human_readable() {
        let json = r#"{"slots":[
            {"day":"fri","start":"10:00","end":"16:00"},
            {"day":"mon","start":"13:00","end":"18:00"},
            {"day":"mon","start":"09:00","end":"12:00"}
        ]}"#;
        let hours = BusinessHours::from_json(json).unwrap();
        assert_eq!(
            hours.to_human_readable(),
            "Mon 09:00~12:00, Mon 13:00~18:00, Fri 10:00~16:00"
        );
    }
}
