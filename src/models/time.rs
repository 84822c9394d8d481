use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minute-resolution clock time within a single business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            hour <= 23 && minute <= 59,
            "time out of range: {hour:02}:{minute:02}"
        );
        Ok(Self { hour, minute })
    }

    /// Strict `HH:MM`.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
        let hour: u32 = h
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
        let minute: u32 = m
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
        Self::new(hour, minute)
    }

    pub fn minutes_from_midnight(&self) -> i64 {
        (self.hour * 60 + self.minute) as i64
    }

    /// Shift forward by `minutes`. A shift that would cross midnight (or a
    /// negative shift) is a caller input error and returns `None`.
    pub fn add_minutes(&self, minutes: i64) -> Option<TimeOfDay> {
        if minutes < 0 {
            return None;
        }
        let total = self.minutes_from_midnight() + minutes;
        if total >= 24 * 60 {
            return None;
        }
        Some(TimeOfDay {
            hour: (total / 60) as u32,
            minute: (total % 60) as u32,
        })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse(&s).map_err(D::Error::custom)
    }
}

pub fn duration_minutes(start: TimeOfDay, end: TimeOfDay) -> i64 {
    end.minutes_from_midnight() - start.minutes_from_midnight()
}

/// Half-open `[start, end)` interval within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Strict `HH:MM~HH:MM`. Accepts the full-width tilde customers tend to
    /// type on mobile keyboards.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (a, b) = s
            .split_once('~')
            .or_else(|| s.split_once('～'))
            .ok_or_else(|| anyhow::anyhow!("invalid time range format: {s}"))?;
        Ok(Self {
            start: TimeOfDay::parse(a.trim())?,
            end: TimeOfDay::parse(b.trim())?,
        })
    }

    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self.start, self.end)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(t("09:30").to_string(), "09:30");
        assert_eq!(t("0:05").to_string(), "00:05");
        assert_eq!(t("23:59").to_string(), "23:59");
    }

    #[test]
    fn test_parse_invalid_times() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("10:60").is_err());
        assert!(TimeOfDay::parse("1030").is_err());
        assert!(TimeOfDay::parse("ten:30").is_err());
        assert!(TimeOfDay::parse("").is_err());
    }

    #[test]
    fn test_add_minutes_rolls_over_hours() {
        assert_eq!(t("10:45").add_minutes(30), Some(t("11:15")));
        assert_eq!(t("09:00").add_minutes(150), Some(t("11:30")));
        assert_eq!(t("09:00").add_minutes(0), Some(t("09:00")));
    }

    #[test]
    fn test_add_minutes_refuses_midnight_crossing() {
        assert_eq!(t("23:30").add_minutes(60), None);
        assert_eq!(t("23:59").add_minutes(1), None);
        assert_eq!(t("10:00").add_minutes(-10), None);
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(t("09:00"), t("10:30")), 90);
        assert_eq!(duration_minutes(t("10:30"), t("09:00")), -90);
        assert_eq!(duration_minutes(t("12:00"), t("12:00")), 0);
    }

    #[test]
    fn test_range_parse() {
        let r = TimeRange::parse("10:00~11:30").unwrap();
        assert_eq!(r.start, t("10:00"));
        assert_eq!(r.end, t("11:30"));
        assert_eq!(r.to_string(), "10:00~11:30");

        let fullwidth = TimeRange::parse("10:00～11:30").unwrap();
        assert_eq!(fullwidth, r);

        assert!(TimeRange::parse("10:00-11:30").is_err());
        assert!(TimeRange::parse("10:00~").is_err());
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let a = TimeRange::parse("10:00~11:00").unwrap();
        let b = TimeRange::parse("11:00~12:00").unwrap();
        let c = TimeRange::parse("10:30~11:30").unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_contains() {
        let outer = TimeRange::parse("09:00~12:00").unwrap();
        let inner = TimeRange::parse("10:00~11:00").unwrap();
        let edge = TimeRange::parse("09:00~12:00").unwrap();
        let spill = TimeRange::parse("11:00~12:30").unwrap();
        assert!(outer.contains(&inner));
        assert!(outer.contains(&edge));
        assert!(!outer.contains(&spill));
    }
}
