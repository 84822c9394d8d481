pub mod catalog;
pub mod intent;
pub mod reservation;
pub mod schedule;
pub mod session;
pub mod time;

pub use catalog::{
    BusinessProfile, KeywordTables, ServiceDefinition, StaffDefinition, DEFAULT_DURATION_MINUTES,
    UNASSIGNED_STAFF,
};
pub use intent::Intent;
pub use reservation::{
    format_reservation_id, is_reservation_id, DraftReservation, ModificationChanges, Reservation,
    ReservationStatus,
};
pub use schedule::{BlockingInterval, BusinessHours, OpenSlot, OwnerKind};
pub use session::{
    CancelFlow, CancelStep, CreateFlow, CreateStep, FlowState, ModifyField, ModifyFlow, ModifyStep,
    Session, SESSION_IDLE_MINUTES,
};
pub use time::{duration_minutes, TimeOfDay, TimeRange};
