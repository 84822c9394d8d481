use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reservation::{DraftReservation, Reservation};
use super::time::TimeRange;

/// Idle sessions are purged after this long. Advisory cleanup: a missing
/// session simply restarts the flow from scratch.
pub const SESSION_IDLE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStep {
    ServiceSelection,
    StaffSelection,
    DateSelection,
    TimeSelection,
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyStep {
    ReservationLookup,
    FieldChoice,
    DateChoice,
    TimeWindowChoice,
    ServiceChoice,
    StaffChoice,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStep {
    ReservationLookup,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyField {
    Time,
    Service,
    Staff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlow {
    pub step: CreateStep,
    pub draft: DraftReservation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyFlow {
    pub step: ModifyStep,
    /// The user's reservations as presented for selection, 1-based in the
    /// prompt.
    pub candidates: Vec<Reservation>,
    pub target: Option<Reservation>,
    pub field: Option<ModifyField>,
    pub new_date: Option<NaiveDate>,
    pub new_range: Option<TimeRange>,
    pub new_service: Option<String>,
    pub new_staff: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelFlow {
    pub step: CancelStep,
    pub candidates: Vec<Reservation>,
    pub target: Option<Reservation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Create(CreateFlow),
    Modify(ModifyFlow),
    Cancel(CancelFlow),
}

impl FlowState {
    pub fn step_name(&self) -> &'static str {
        match self {
            FlowState::Create(f) => match f.step {
                CreateStep::ServiceSelection => "create:service_selection",
                CreateStep::StaffSelection => "create:staff_selection",
                CreateStep::DateSelection => "create:date_selection",
                CreateStep::TimeSelection => "create:time_selection",
                CreateStep::Confirmation => "create:confirmation",
            },
            FlowState::Modify(f) => match f.step {
                ModifyStep::ReservationLookup => "modify:reservation_lookup",
                ModifyStep::FieldChoice => "modify:field_choice",
                ModifyStep::DateChoice => "modify:date_choice",
                ModifyStep::TimeWindowChoice => "modify:time_window_choice",
                ModifyStep::ServiceChoice => "modify:service_choice",
                ModifyStep::StaffChoice => "modify:staff_choice",
                ModifyStep::Confirm => "modify:confirm",
            },
            FlowState::Cancel(f) => match f.step {
                CancelStep::ReservationLookup => "cancel:reservation_lookup",
                CancelStep::Confirm => "cancel:confirm",
            },
        }
    }
}

/// Per-user conversation state. One session per user id; created on the
/// first in-flow message, deleted on any terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub flow: FlowState,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    fn new(user_id: &str, flow: FlowState) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            user_id: user_id.to_string(),
            flow,
            last_activity: now,
            expires_at: now + Duration::minutes(SESSION_IDLE_MINUTES),
        }
    }

    pub fn create(user_id: &str) -> Self {
        Self::new(
            user_id,
            FlowState::Create(CreateFlow {
                step: CreateStep::ServiceSelection,
                draft: DraftReservation::default(),
            }),
        )
    }

    pub fn modify(user_id: &str, candidates: Vec<Reservation>) -> Self {
        Self::new(
            user_id,
            FlowState::Modify(ModifyFlow {
                step: ModifyStep::ReservationLookup,
                candidates,
                target: None,
                field: None,
                new_date: None,
                new_range: None,
                new_service: None,
                new_staff: None,
            }),
        )
    }

    pub fn cancel(user_id: &str, candidates: Vec<Reservation>) -> Self {
        Self::new(
            user_id,
            FlowState::Cancel(CancelFlow {
                step: CancelStep::ReservationLookup,
                candidates,
                target: None,
            }),
        )
    }

    pub fn touch(&mut self) {
        let now = Utc::now().naive_utc();
        self.last_activity = now;
        self.expires_at = now + Duration::minutes(SESSION_IDLE_MINUTES);
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }
}
