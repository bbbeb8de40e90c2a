pub mod sse;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio_stream::{Stream, StreamExt};

use crate::errors::ClientError;

pub use sse::SseTransport;

/// Domain areas a push event can invalidate. Event payloads are never
/// authoritative — consumers refetch over REST on every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Bookings,
    Earnings,
}

impl Topic {
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "booking_created" | "booking_updated" => Some(Topic::Bookings),
            "earnings_updated" => Some(Topic::Earnings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub topic: Topic,
}

/// A named event as it arrives off the wire. `data` is kept only for
/// logging; invalidation consumers ignore it.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub name: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Live,
    Reconnecting { attempt: u32 },
    Offline,
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<RealtimeEvent, ClientError>> + Send>>;

/// Connection seam for the push channel. Connecting joins the per-user
/// room: the user id travels with the connect call and the backend scopes
/// the stream to that user's events.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self, user_id: &str) -> Result<EventStream, ClientError>;
}

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Owns the push connection for a session: fans incoming events out as
/// [`Invalidation`] signals on a broadcast channel and publishes the
/// connection state for the UI's "Live" indicator.
pub struct RealtimeSubscriber {
    events_tx: broadcast::Sender<Invalidation>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
}

impl RealtimeSubscriber {
    pub fn spawn(transport: Arc<dyn RealtimeTransport>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_events = events_tx.clone();
        tokio::spawn(run_subscriber(
            transport,
            user_id,
            loop_events,
            state_tx,
            shutdown_rx,
        ));

        Self {
            events_tx,
            state_rx,
            shutdown_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.events_tx.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn is_live(&self) -> bool {
        *self.state_rx.borrow() == ConnectionState::Live
    }

    /// Tear the connection down. No invalidations are delivered afterwards.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn run_subscriber(
    transport: Arc<dyn RealtimeTransport>,
    user_id: String,
    events_tx: broadcast::Sender<Invalidation>,
    state_tx: watch::Sender<ConnectionState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match transport.connect(&user_id).await {
            Ok(mut stream) => {
                tracing::info!(user_id, "realtime channel connected");
                let _ = state_tx.send(ConnectionState::Live);
                attempt = 0;

                loop {
                    tokio::select! {
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                let _ = state_tx.send(ConnectionState::Offline);
                                return;
                            }
                        }
                        item = stream.next() => match item {
                            Some(Ok(event)) => {
                                match Topic::from_event_name(&event.name) {
                                    Some(topic) => {
                                        let _ = events_tx.send(Invalidation { topic });
                                    }
                                    None => {
                                        tracing::trace!(event = %event.name, "ignoring event");
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "realtime stream error");
                                break;
                            }
                            None => {
                                tracing::info!("realtime stream closed by server");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "realtime connect failed");
            }
        }

        attempt += 1;
        if attempt > MAX_RECONNECT_ATTEMPTS {
            tracing::warn!("giving up after {MAX_RECONNECT_ATTEMPTS} reconnect attempts");
            let _ = state_tx.send(ConnectionState::Offline);
            return;
        }
        let _ = state_tx.send(ConnectionState::Reconnecting { attempt });

        let delay = reconnect_delay(attempt);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    let _ = state_tx.send(ConnectionState::Offline);
                    return;
                }
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Offline);
}

fn reconnect_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(6);
    RECONNECT_BASE_DELAY
        .saturating_mul(1u32 << shift)
        .min(RECONNECT_MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_mapping() {
        assert_eq!(
            Topic::from_event_name("booking_created"),
            Some(Topic::Bookings)
        );
        assert_eq!(
            Topic::from_event_name("booking_updated"),
            Some(Topic::Bookings)
        );
        assert_eq!(
            Topic::from_event_name("earnings_updated"),
            Some(Topic::Earnings)
        );
        assert_eq!(Topic::from_event_name("connect"), None);
        assert_eq!(Topic::from_event_name(""), None);
    }

    #[test]
    fn test_reconnect_delay_caps() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(2), Duration::from_secs(2));
        assert_eq!(reconnect_delay(3), Duration::from_secs(4));
        assert!(reconnect_delay(12) <= RECONNECT_MAX_DELAY);
    }
}
