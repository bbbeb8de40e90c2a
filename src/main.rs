use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use housecall::api::{ApiClient, StaticTokens};
use housecall::config::AppConfig;
use housecall::models::BookingStatus;
use housecall::realtime::{ConnectionState, RealtimeSubscriber, SseTransport, Topic};
use housecall::storage::LocalStore;
use housecall::sync::{ProviderBookingSource, Synced};

/// Headless booking watcher: loads the provider's booking list, keeps it
/// synchronized off the push channel, and logs changes until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.user_id.is_empty(), "USER_ID must be set");
    let token = std::env::var("ACCESS_TOKEN").unwrap_or_default();
    anyhow::ensure!(!token.is_empty(), "ACCESS_TOKEN must be set");

    let tokens = Arc::new(StaticTokens::new(token));
    let client = Arc::new(ApiClient::new(
        &config.api_base_url,
        tokens.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?);

    let store = LocalStore::open(&config.store_path)?;
    match client.profile().await {
        Ok(resp) => {
            if let Some(profile) = resp.data {
                tracing::info!(name = %profile.name, "signed in");
                if let Some(image) = profile.profile_image.as_deref() {
                    store.set_profile_image_url(image)?;
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "profile fetch failed"),
    }

    let transport = Arc::new(SseTransport::new(&config.api_base_url, tokens)?);
    let subscriber = RealtimeSubscriber::spawn(transport, config.user_id.clone());

    let feed = Synced::new(Arc::new(ProviderBookingSource {
        client: Arc::clone(&client),
    }));
    let invalidations = feed.bind_invalidations(subscriber.subscribe(), Topic::Bookings);

    tracing::info!(base_url = %config.api_base_url, "watching bookings");
    feed.load().await;

    let mut last_seen: Vec<(String, BookingStatus)> = Vec::new();
    report_changes(&feed, &mut last_seen);

    let mut state_rx = subscriber.connection_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                match *state_rx.borrow() {
                    ConnectionState::Live => tracing::info!("live"),
                    ConnectionState::Connecting => tracing::info!("connecting"),
                    ConnectionState::Reconnecting { attempt } => {
                        tracing::warn!(attempt, "reconnecting");
                    }
                    ConnectionState::Offline => tracing::warn!("offline"),
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                report_changes(&feed, &mut last_seen);
            }
        }
    }

    subscriber.shutdown();
    feed.shutdown();
    invalidations.abort();

    Ok(())
}

fn report_changes(
    feed: &Synced<housecall::models::Booking>,
    last_seen: &mut Vec<(String, BookingStatus)>,
) {
    let snapshot = feed.snapshot();
    if let Some(message) = &snapshot.last_error {
        tracing::warn!(%message, "booking fetch failed");
        return;
    }

    let current: Vec<(String, BookingStatus)> = snapshot
        .items
        .iter()
        .map(|b| (b.id.clone(), b.status))
        .collect();
    if current == *last_seen {
        return;
    }

    for booking in &snapshot.items {
        tracing::info!(
            id = %booking.id,
            status = booking.status.as_str(),
            customer = %booking.customer_name,
            service = %booking.service_name,
            date = %booking.appointment_date,
            "booking"
        );
    }
    *last_seen = current;
}
