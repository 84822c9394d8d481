use std::sync::Arc;

use crate::models::{
    BusinessProfile, FlowState, Intent, ModificationChanges, Reservation, Session,
};
use crate::services::directory::{IdentityResolver, ReservationDirectory};
use crate::services::flows::{self, cancel, create, modify, FlowOutcome, SideEffect};
use crate::services::intent::classify;
use crate::services::session_store::SessionStore;

const UPSTREAM_FAILURE_REPLY: &str =
    "Sorry, something went wrong on our side. Nothing has been saved — please try again in a moment.";

const NO_RESERVATIONS_REPLY: &str =
    "I couldn't find any upcoming reservations for you. Would you like to make one?";

/// The finalized action a committed flow produced. Handed to the transport
/// so it can compose team alerts; persistence has already happened.
#[derive(Debug, Clone)]
pub enum EngineAction {
    Created(Reservation),
    Modified {
        reservation_id: String,
        changes: ModificationChanges,
    },
    Cancelled {
        reservation_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct EngineReply {
    pub text: String,
    pub action: Option<EngineAction>,
}

impl EngineReply {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }
}

/// Facade over the three booking flows: routes each message either into the
/// user's live session or through the intent classifier, and owns the only
/// points where collaborator failures are converted to user-facing replies.
pub struct BookingEngine {
    profile: BusinessProfile,
    sessions: SessionStore,
    directory: Arc<dyn ReservationDirectory>,
    identity: Arc<dyn IdentityResolver>,
}

impl BookingEngine {
    pub fn new(
        profile: BusinessProfile,
        directory: Arc<dyn ReservationDirectory>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            profile,
            sessions: SessionStore::new(),
            directory,
            identity,
        }
    }

    /// One user utterance in, one reply out. `None` means the message is
    /// not booking-related and the caller should answer it another way.
    pub async fn handle(&self, user_id: &str, message: &str) -> Option<EngineReply> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        // In-flow messages stay in their flow until a terminal outcome,
        // regardless of keyword content.
        if let Some(entry) = self.sessions.get(user_id) {
            let mut session = entry.lock().await;
            // A message queued behind a terminal transition may hold a
            // removed entry; treat that as having no session.
            if self.sessions.is_current(user_id, &entry) {
                return Some(self.advance_session(&mut session, message).await);
            }
        }

        match classify(message, &self.profile.keywords) {
            Some(Intent::Reserve) => {
                tracing::info!(user = %user_id, "opening create flow");
                self.sessions.put(Session::create(user_id));
                Some(EngineReply::text_only(create::opening_reply(&self.profile)))
            }
            Some(Intent::Modify) => Some(self.open_lookup_flow(user_id, Intent::Modify).await),
            Some(Intent::Cancel) => Some(self.open_lookup_flow(user_id, Intent::Cancel).await),
            None => None,
        }
    }

    /// Modify and Cancel both open on the user's reservation list.
    async fn open_lookup_flow(&self, user_id: &str, intent: Intent) -> EngineReply {
        let candidates = match self.directory.list_user_reservations(user_id).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(error = %e, user = %user_id, "reservation lookup failed");
                return EngineReply::text_only(UPSTREAM_FAILURE_REPLY);
            }
        };
        if candidates.is_empty() {
            return EngineReply::text_only(NO_RESERVATIONS_REPLY);
        }

        match intent {
            Intent::Modify => {
                tracing::info!(user = %user_id, count = candidates.len(), "opening modify flow");
                let text = modify::opening_reply(&candidates);
                self.sessions.put(Session::modify(user_id, candidates));
                EngineReply::text_only(text)
            }
            _ => {
                tracing::info!(user = %user_id, count = candidates.len(), "opening cancel flow");
                let text = cancel::opening_reply(&candidates);
                self.sessions.put(Session::cancel(user_id, candidates));
                EngineReply::text_only(text)
            }
        }
    }

    async fn advance_session(&self, session: &mut Session, message: &str) -> EngineReply {
        let user_id = session.user_id.clone();

        // Interrupt keywords beat state-specific parsing in every
        // non-terminal state; terminal states never reach here because
        // their sessions are removed.
        if self.profile.keywords.is_abort(message) {
            tracing::info!(user = %user_id, step = session.flow.step_name(), "flow aborted by user");
            self.sessions.remove(&user_id);
            return EngineReply::text_only(flows::ABORTED_REPLY);
        }

        tracing::info!(user = %user_id, step = session.flow.step_name(), "advancing booking flow");

        let ctx = flows::FlowContext {
            profile: &self.profile,
            directory: self.directory.as_ref(),
            user_id: &user_id,
        };

        let result = match &mut session.flow {
            FlowState::Create(f) => create::advance(f, &ctx, message).await,
            FlowState::Modify(f) => modify::advance(f, &ctx, message).await,
            FlowState::Cancel(f) => cancel::advance(f, &ctx, message).await,
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user = %user_id,
                    step = session.flow.step_name(),
                    "collaborator failure, clearing session"
                );
                self.sessions.remove(&user_id);
                return EngineReply::text_only(UPSTREAM_FAILURE_REPLY);
            }
        };

        match reply.outcome {
            FlowOutcome::Continue => {
                session.touch();
                EngineReply::text_only(reply.text)
            }
            FlowOutcome::Aborted => {
                self.sessions.remove(&user_id);
                EngineReply::text_only(reply.text)
            }
            FlowOutcome::Committed(effect) => {
                // Commit or nothing: the session is cleared either way so a
                // retry starts from scratch instead of double-committing.
                self.sessions.remove(&user_id);
                match self.commit(&user_id, effect).await {
                    Ok(action) => EngineReply {
                        text: reply.text,
                        action: Some(action),
                    },
                    Err(e) => {
                        tracing::error!(error = %e, user = %user_id, "commit failed");
                        EngineReply::text_only(UPSTREAM_FAILURE_REPLY)
                    }
                }
            }
        }
    }

    async fn commit(&self, user_id: &str, effect: SideEffect) -> anyhow::Result<EngineAction> {
        match effect {
            SideEffect::Create(mut reservation) => {
                reservation.customer_name = Some(self.identity.display_name(user_id).await);
                self.directory.persist_reservation(&reservation).await?;
                tracing::info!(user = %user_id, id = %reservation.id, "reservation created");
                Ok(EngineAction::Created(reservation))
            }
            SideEffect::Modify {
                reservation_id,
                changes,
            } => {
                self.directory
                    .persist_modification(&reservation_id, &changes)
                    .await?;
                tracing::info!(user = %user_id, id = %reservation_id, "reservation modified");
                Ok(EngineAction::Modified {
                    reservation_id,
                    changes,
                })
            }
            SideEffect::Cancel { reservation_id } => {
                self.directory.persist_cancellation(&reservation_id).await?;
                tracing::info!(user = %user_id, id = %reservation_id, "reservation cancelled");
                Ok(EngineAction::Cancelled { reservation_id })
            }
        }
    }
}
