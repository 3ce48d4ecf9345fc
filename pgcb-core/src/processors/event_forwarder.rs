//! EventForwarder processor.
//!
//! The EventForwarder is responsible for:
//! - Receiving `CallbackEvent` from the channel
//! - Wrapping it in a `ForwardedEvent` envelope signed with the events secret
//! - POSTing it to the configured downstream URL
//! - Retrying failed deliveries with exponential backoff (2^0 to 2^MAX seconds)
//!
//! Without a configured URL events are only logged.
//!
//! On shutdown, events still queued get a single delivery attempt, and
//! in-flight deliveries get a grace period before they are abandoned.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigStore, EventsConfig};
use crate::events::{CallbackEvent, CallbackEventReceiver};
use pgcb_sdk::objects::ForwardedEvent;
use pgcb_sdk::signature::{SIGNATURE_HEADER, SignedObject};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Highest backoff exponent; also the number of retries after the first attempt.
const MAX_RETRY_COUNT: u32 = 6;

/// How long in-flight deliveries may keep running after shutdown.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },
}

/// What happened to outstanding work when the forwarder stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Events still queued at shutdown that got their single last attempt.
    pub drained: usize,
    /// Deliveries still running when the grace period ran out.
    pub abandoned: usize,
}

/// Delivers published callback events to the downstream endpoint.
pub struct EventForwarder {
    events_rx: CallbackEventReceiver,
    config: ConfigStore<EventsConfig>,
    shutdown_rx: watch::Receiver<bool>,
    http_client: reqwest::Client,
    deliveries: JoinSet<()>,
    shutdown_grace: Duration,
}

impl EventForwarder {
    pub fn new(
        events_rx: CallbackEventReceiver,
        config: ConfigStore<EventsConfig>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            events_rx,
            config,
            shutdown_rx,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            deliveries: JoinSet::new(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub async fn run(mut self) -> ShutdownReport {
        info!("EventForwarder started");

        let mut config_watcher = self.config.subscribe();
        let mut config = Arc::new(self.config.snapshot().await);

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("EventForwarder received shutdown signal");
                        break;
                    }
                }

                Ok(()) = config_watcher.changed() => {
                    config = Arc::new(self.config.snapshot().await);
                    info!(
                        forwarding = config.forward_url.is_some(),
                        version = self.config.version(),
                        "EventForwarder picked up new config"
                    );
                }

                Some(joined) = self.deliveries.join_next(), if !self.deliveries.is_empty() => {
                    log_join_result(joined);
                }

                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        info!("CallbackEvent channel closed");
                        break;
                    };
                    debug!(event = ?event, "Received CallbackEvent");
                    self.spawn_delivery(&config, event, MAX_RETRY_COUNT);
                }
            }
        }

        let report = self.finish(&config).await;
        info!(
            drained = report.drained,
            abandoned = report.abandoned,
            "EventForwarder shutdown complete"
        );
        report
    }

    fn spawn_delivery(&mut self, config: &Arc<EventsConfig>, event: CallbackEvent, max_retries: u32) {
        let http_client = self.http_client.clone();
        let config = Arc::clone(config);
        // retries sleep, keep them off the receive loop
        self.deliveries.spawn(async move {
            forward_with_retry(&http_client, &config, event, max_retries).await;
        });
    }

    async fn finish(mut self, config: &Arc<EventsConfig>) -> ShutdownReport {
        self.events_rx.close();
        let mut drained = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            drained += 1;
            self.spawn_delivery(config, event, 0);
        }
        if drained > 0 {
            info!(drained, "Forwarding queued events once before exit");
        }

        let deliveries = &mut self.deliveries;
        let waited = tokio::time::timeout(self.shutdown_grace, async {
            while let Some(joined) = deliveries.join_next().await {
                log_join_result(joined);
            }
        })
        .await;

        let abandoned = self.deliveries.len();
        if waited.is_err() && abandoned > 0 {
            warn!(abandoned, "Abandoning undelivered events at shutdown");
            self.deliveries.abort_all();
        }

        ShutdownReport { drained, abandoned }
    }
}

fn log_join_result(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "Event delivery task panicked");
        }
    }
}

/// Build the envelope sent downstream for `event`.
pub fn envelope(event: CallbackEvent) -> ForwardedEvent {
    ForwardedEvent {
        event_id: Uuid::now_v7(),
        event: event.name,
        payload: event.payload,
        timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
    }
}

async fn forward_with_retry(
    http_client: &reqwest::Client,
    config: &EventsConfig,
    event: CallbackEvent,
    max_retries: u32,
) {
    let Some(url) = config.forward_url.as_ref() else {
        info!(
            event = %event.name,
            quote = %event.payload.quote,
            "No downstream configured, event logged only"
        );
        return;
    };

    let forwarded = envelope(event);
    let event_id = forwarded.event_id;
    let signed = match SignedObject::new(forwarded, config.secret_bytes()) {
        Ok(signed) => signed,
        Err(e) => {
            error!(event_id = %event_id, error = %e, "Failed to serialize forwarded event");
            return;
        }
    };

    for attempt in 0..=max_retries {
        match send_event(http_client, url, &signed).await {
            Ok(()) => {
                info!(event_id = %event_id, attempt, "Event forwarded");
                return;
            }
            Err(e) if attempt < max_retries => {
                let delay = calculate_retry_delay(attempt);
                warn!(
                    event_id = %event_id,
                    error = %e,
                    attempt,
                    retry_in_secs = delay.as_secs(),
                    "Event delivery failed"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(event_id = %event_id, error = %e, "Giving up on event delivery");
            }
        }
    }
}

async fn send_event(
    http_client: &reqwest::Client,
    url: &Url,
    signed: &SignedObject<ForwardedEvent>,
) -> Result<(), ForwardError> {
    let response = http_client
        .post(url.clone())
        .header("Content-Type", "application/json")
        .header(SIGNATURE_HEADER, signed.to_header())
        .body(signed.json.clone())
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ForwardError::DeliveryFailed {
            status: status.as_u16(),
            body,
        })
    }
}

/// Exponential backoff: 2^retry_count seconds, capped at 2^MAX_RETRY_COUNT.
pub fn calculate_retry_delay(retry_count: u32) -> Duration {
    let seconds = 2u64.pow(retry_count.min(MAX_RETRY_COUNT));
    Duration::from_secs(seconds)
}
