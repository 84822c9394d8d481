pub mod cancel;
pub mod create;
pub mod modify;

use chrono::NaiveDate;

use crate::models::{
    is_reservation_id, BusinessProfile, ModificationChanges, Reservation, TimeRange,
    UNASSIGNED_STAFF,
};
use crate::services::availability;
use crate::services::directory::ReservationDirectory;

pub const ABORTED_REPLY: &str =
    "No problem, I've stopped that request. Message us again any time.";

/// What a terminal "commit" transition asks the facade to persist.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Create(Reservation),
    Modify {
        reservation_id: String,
        changes: ModificationChanges,
    },
    Cancel {
        reservation_id: String,
    },
}

#[derive(Debug, Clone)]
pub enum FlowOutcome {
    Continue,
    Committed(SideEffect),
    Aborted,
}

#[derive(Debug, Clone)]
pub struct FlowReply {
    pub text: String,
    pub outcome: FlowOutcome,
}

impl FlowReply {
    /// Re-prompt or ordinary forward step: the session stays alive.
    pub fn stay(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: FlowOutcome::Continue,
        }
    }

    pub fn committed(text: impl Into<String>, effect: SideEffect) -> Self {
        Self {
            text: text.into(),
            outcome: FlowOutcome::Committed(effect),
        }
    }

    pub fn aborted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: FlowOutcome::Aborted,
        }
    }
}

/// Everything a flow needs per advance: the shop profile and the (read-only
/// here) collaborator handles. Collaborator errors propagate to the facade.
pub struct FlowContext<'a> {
    pub profile: &'a BusinessProfile,
    pub directory: &'a dyn ReservationDirectory,
    pub user_id: &'a str,
}

impl FlowContext<'_> {
    /// Fetch the day's booking snapshot and compute its free windows.
    pub async fn free_windows_for(
        &self,
        date: NaiveDate,
        staff_filter: Option<&str>,
        exclude_reservation: Option<&str>,
    ) -> anyhow::Result<Vec<TimeRange>> {
        let blocking = self.directory.list_blocking_intervals(date).await?;
        let periods = self.profile.hours.periods_for(date);
        Ok(availability::free_windows(
            date,
            &periods,
            &blocking,
            staff_filter,
            exclude_reservation,
        ))
    }
}

pub fn staff_display(name: &str) -> &str {
    if name == UNASSIGNED_STAFF {
        "no preference"
    } else {
        name
    }
}

/// Numbered list shown in the Modify/Cancel lookup prompts.
pub fn reservation_list(candidates: &[Reservation]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {} with {} on {} {} ({})",
                i + 1,
                r.service,
                staff_display(&r.staff),
                r.date,
                r.range(),
                r.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve a lookup reply: a 1-based index into the presented list, or a
/// literal `RES-YYYYMMDD-NNNN` id belonging to it. Anything else is `None`
/// and the caller re-prompts without a state change.
pub fn select_reservation<'a>(
    candidates: &'a [Reservation],
    message: &str,
) -> Option<&'a Reservation> {
    let msg = message.trim();
    if let Ok(index) = msg.parse::<usize>() {
        if (1..=candidates.len()).contains(&index) {
            return Some(&candidates[index - 1]);
        }
        return None;
    }
    if is_reservation_id(msg) {
        return candidates.iter().find(|r| r.id == msg);
    }
    None
}

pub fn windows_list(windows: &[TimeRange]) -> String {
    windows
        .iter()
        .map(|w| format!("- {w}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReservationStatus, TimeOfDay};
    use chrono::{NaiveDate, Utc};

    fn reservation(id: &str) -> Reservation {
        let now = Utc::now().naive_utc();
        Reservation {
            id: id.to_string(),
            customer_id: "U1".to_string(),
            customer_name: None,
            service: "Cut".to_string(),
            staff: "Alice".to_string(),
            date: NaiveDate::parse_from_str("2025-01-15", "%Y-%m-%d").unwrap(),
            start: TimeOfDay::parse("10:00").unwrap(),
            end: TimeOfDay::parse("11:00").unwrap(),
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_select_reservation_by_index() {
        let candidates = vec![
            reservation("RES-20250115-0001"),
            reservation("RES-20250115-0002"),
        ];
        assert_eq!(
            select_reservation(&candidates, "2").unwrap().id,
            "RES-20250115-0002"
        );
        assert!(select_reservation(&candidates, "0").is_none());
        assert!(select_reservation(&candidates, "3").is_none());
    }

    #[test]
    fn test_select_reservation_by_id() {
        let candidates = vec![reservation("RES-20250115-0001")];
        assert_eq!(
            select_reservation(&candidates, " RES-20250115-0001 ")
                .unwrap()
                .id,
            "RES-20250115-0001"
        );
        // Well-formed but not one of the user's reservations.
        assert!(select_reservation(&candidates, "RES-20250115-0009").is_none());
        assert!(select_reservation(&candidates, "first one").is_none());
    }
}
