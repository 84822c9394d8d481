use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{BlockingInterval, ModificationChanges, Reservation};

/// Reservation storage boundary. Implementations own durability and id
/// uniqueness; the engine only reads snapshots and issues commit requests,
/// and never retries a failed commit itself.
#[async_trait]
pub trait ReservationDirectory: Send + Sync {
    /// The customer's upcoming confirmed reservations, oldest first.
    async fn list_user_reservations(&self, customer_id: &str) -> anyhow::Result<Vec<Reservation>>;

    /// Blocking intervals for every confirmed reservation on `date`;
    /// cancelled rows are already excluded.
    async fn list_blocking_intervals(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<BlockingInterval>>;

    /// Next `RES-YYYYMMDD-NNNN` id for `date`.
    async fn next_reservation_id(&self, date: NaiveDate) -> anyhow::Result<String>;

    async fn persist_reservation(&self, reservation: &Reservation) -> anyhow::Result<()>;

    async fn persist_modification(
        &self,
        reservation_id: &str,
        changes: &ModificationChanges,
    ) -> anyhow::Result<()>;

    async fn persist_cancellation(&self, reservation_id: &str) -> anyhow::Result<()>;
}

/// Display-name lookup, used only when composing human-readable
/// confirmations, never for control flow.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn display_name(&self, user_id: &str) -> String;
}
