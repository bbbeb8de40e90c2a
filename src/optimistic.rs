use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::{Booking, BookingStatus, RatingSubmission, ReportSubmission, TransitionAction};
use crate::sync::Synced;

/// Reconciliation state of a single booking.
///
/// `Confirmed` mirrors the server; `Pending` means an optimistic status is
/// showing locally while a transition request is in flight, with the prior
/// server-confirmed status retained for revert. A `Pending` entry refuses
/// further transitions, so one user action maps to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Confirmed,
    Pending { prior: BookingStatus },
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("booking not found")]
    NotFound,

    #[error("another update for this booking is still in flight")]
    AlreadyInFlight,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ActionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ActionError::NotFound => "This booking is no longer available.",
            ActionError::AlreadyInFlight => "Please wait for the previous action to finish.",
            ActionError::Client(e) => e.user_message(),
        }
    }
}

/// Drives booking status transitions over a [`Synced`] feed:
/// guard → optimistic mutation → REST call → commit + background refetch,
/// or revert to the prior status on any failure.
pub struct BookingActions {
    client: Arc<ApiClient>,
    feed: Synced<Booking>,
    pending: Mutex<HashMap<String, BookingStatus>>,
}

impl BookingActions {
    pub fn new(client: Arc<ApiClient>, feed: Synced<Booking>) -> Self {
        Self {
            client,
            feed,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn state_of(&self, booking_id: &str) -> EntryState {
        self.pending
            .lock()
            .ok()
            .and_then(|pending| pending.get(booking_id).copied())
            .map(|prior| EntryState::Pending { prior })
            .unwrap_or(EntryState::Confirmed)
    }

    pub async fn accept(&self, booking_id: &str) -> Result<(), ActionError> {
        self.transition(booking_id, TransitionAction::Accept).await
    }

    pub async fn reject(
        &self,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<(), ActionError> {
        self.transition(booking_id, TransitionAction::Reject { reason })
            .await
    }

    pub async fn complete(&self, booking_id: &str) -> Result<(), ActionError> {
        self.transition(booking_id, TransitionAction::Complete).await
    }

    async fn transition(&self, booking_id: &str, action: TransitionAction) -> Result<(), ActionError> {
        self.begin(booking_id, action.target_status())?;

        let result = self.client.update_booking_status(booking_id, &action).await;
        match result {
            Ok(resp) if resp.ok => {
                self.commit(booking_id);
                self.schedule_refetch();
                Ok(())
            }
            Ok(resp) => {
                self.revert(booking_id);
                let err = resp
                    .err()
                    .unwrap_or_else(|| ClientError::Malformed("unexpected response".to_string()));
                Err(ActionError::Client(err))
            }
            Err(e) => {
                self.revert(booking_id);
                Err(ActionError::Client(e))
            }
        }
    }

    /// Submit a post-completion customer rating. Not optimistic: the
    /// rating becomes visible through the next fetch.
    pub async fn rate(
        &self,
        booking_id: &str,
        rating: u8,
        review: Option<String>,
    ) -> Result<(), ActionError> {
        let body = RatingSubmission { rating, review };
        let resp = self.client.rate_customer(booking_id, &body).await?;
        match resp.err() {
            None => {
                self.schedule_refetch();
                Ok(())
            }
            Some(err) => Err(ActionError::Client(err)),
        }
    }

    pub async fn report(
        &self,
        booking_id: &str,
        reason: String,
        description: Option<String>,
    ) -> Result<(), ActionError> {
        let body = ReportSubmission {
            reason,
            description,
        };
        let resp = self.client.report_customer(booking_id, &body).await?;
        match resp.err() {
            None => {
                self.schedule_refetch();
                Ok(())
            }
            Some(err) => Err(ActionError::Client(err)),
        }
    }

    /// Record the prior status and apply the optimistic one. Fails if the
    /// booking is unknown or already has a transition in flight.
    fn begin(&self, booking_id: &str, target: BookingStatus) -> Result<(), ActionError> {
        let Ok(mut pending) = self.pending.lock() else {
            return Err(ActionError::NotFound);
        };
        if pending.contains_key(booking_id) {
            return Err(ActionError::AlreadyInFlight);
        }

        let prior = self
            .feed
            .update_items(|items| {
                items.iter_mut().find(|b| b.id == booking_id).map(|b| {
                    let prior = b.status;
                    b.status = target;
                    prior
                })
            })
            .flatten()
            .ok_or(ActionError::NotFound)?;

        pending.insert(booking_id.to_string(), prior);
        Ok(())
    }

    fn commit(&self, booking_id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(booking_id);
        }
    }

    /// Restore the status the server last confirmed, whatever it was —
    /// a failed `complete` on an accepted booking goes back to accepted,
    /// not to pending.
    fn revert(&self, booking_id: &str) {
        let prior = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(booking_id));
        if let Some(prior) = prior {
            self.feed.update_items(|items| {
                if let Some(b) = items.iter_mut().find(|b| b.id == booking_id) {
                    b.status = prior;
                }
            });
        }
    }

    fn schedule_refetch(&self) {
        let feed = self.feed.clone();
        tokio::spawn(async move {
            feed.refresh().await;
        });
    }
}
