use chrono::NaiveDate;

use crate::models::{BlockingInterval, OwnerKind, TimeRange};

/// Every committed booking the candidate overlaps for the given owner
/// (half-open overlap test). `exclude_reservation` skips the reservation
/// under edit so a modify flow does not conflict with itself.
pub fn find_conflicts<'a>(
    candidate: &TimeRange,
    date: NaiveDate,
    owner_kind: OwnerKind,
    owner_id: &str,
    blocking: &'a [BlockingInterval],
    exclude_reservation: Option<&str>,
) -> Vec<&'a BlockingInterval> {
    blocking
        .iter()
        .filter(|b| b.date == date && b.owner_kind == owner_kind && b.owner_id == owner_id)
        .filter(|b| exclude_reservation != Some(b.reservation_id.as_str()))
        .filter(|b| candidate.overlaps(&b.range))
        .collect()
}

pub fn has_conflict(
    candidate: &TimeRange,
    date: NaiveDate,
    owner_kind: OwnerKind,
    owner_id: &str,
    blocking: &[BlockingInterval],
    exclude_reservation: Option<&str>,
) -> bool {
    !find_conflicts(
        candidate,
        date,
        owner_kind,
        owner_id,
        blocking,
        exclude_reservation,
    )
    .is_empty()
}

/// Occupied ranges for user-facing "that conflicts with ..." replies.
pub fn describe_conflicts(conflicts: &[&BlockingInterval]) -> String {
    conflicts
        .iter()
        .map(|b| b.range.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn r(s: &str) -> TimeRange {
        TimeRange::parse(s).unwrap()
    }

    fn block(
        range: &str,
        owner_kind: OwnerKind,
        owner_id: &str,
        reservation_id: &str,
    ) -> BlockingInterval {
        BlockingInterval {
            date: d("2025-01-15"),
            range: r(range),
            owner_kind,
            owner_id: owner_id.to_string(),
            reservation_id: reservation_id.to_string(),
        }
    }

    #[test]
    fn test_detects_overlap_for_same_owner() {
        let blocking = [block("10:00~11:00", OwnerKind::Staff, "Alice", "RES-20250115-0001")];
        let conflicts = find_conflicts(
            &r("10:30~11:30"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        );
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].reservation_id, "RES-20250115-0001");
    }

    #[test]
    fn test_adjacent_ranges_do_not_conflict() {
        let blocking = [block("10:00~11:00", OwnerKind::Staff, "Alice", "RES-20250115-0001")];
        assert!(!has_conflict(
            &r("11:00~12:00"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        ));
        assert!(!has_conflict(
            &r("09:00~10:00"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        ));
    }

    #[test]
    fn test_other_staff_bookings_do_not_conflict() {
        let blocking = [block("10:00~11:00", OwnerKind::Staff, "Ben", "RES-20250115-0001")];
        assert!(!has_conflict(
            &r("10:00~11:00"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        ));
    }

    #[test]
    fn test_owner_kinds_are_distinct_namespaces() {
        // A customer called "Alice" must not collide with staff "Alice".
        let blocking = [block("10:00~11:00", OwnerKind::Customer, "Alice", "RES-20250115-0001")];
        assert!(!has_conflict(
            &r("10:00~11:00"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        ));
    }

    #[test]
    fn test_excluded_reservation_never_conflicts() {
        let blocking = [block("10:00~11:00", OwnerKind::Staff, "Alice", "RES-20250115-0007")];
        assert!(!has_conflict(
            &r("10:00~11:00"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            Some("RES-20250115-0007"),
        ));
    }

    #[test]
    fn test_describe_conflicts_lists_ranges() {
        let blocking = [
            block("10:00~11:00", OwnerKind::Staff, "Alice", "RES-20250115-0001"),
            block("11:30~12:00", OwnerKind::Staff, "Alice", "RES-20250115-0002"),
        ];
        let conflicts = find_conflicts(
            &r("10:30~11:45"),
            d("2025-01-15"),
            OwnerKind::Staff,
            "Alice",
            &blocking,
            None,
        );
        assert_eq!(describe_conflicts(&conflicts), "10:00~11:00, 11:30~12:00");
    }
}
