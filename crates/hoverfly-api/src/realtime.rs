//! # Realtime Broadcaster
//!
//! Per-mission fan-out of telemetry events to live WebSocket
//! subscribers. Delivery is at-most-once: a subscriber that
//! disconnects mid-publish is dropped silently and receives nothing
//! further. Publishing happens only after the store commit, so every
//! delivered event corresponds to durable state.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use hoverfly_domain::{MissionAnalytics, StoredSample};

/// Event name for telemetry fan-out frames.
pub const TELEMETRY_EVENT: &str = "real-time-drone-data";

/// Identifies one WebSocket connection across its subscriptions.
pub type ConnectionId = Uuid;

/// Outbound frame for a committed telemetry sample.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent<'a> {
    pub event: &'static str,
    pub mission_id: Uuid,
    pub data: &'a StoredSample,
    pub analytics: &'a MissionAnalytics,
}

impl<'a> TelemetryEvent<'a> {
    pub fn new(
        mission_id: Uuid,
        data: &'a StoredSample,
        analytics: &'a MissionAnalytics,
    ) -> Self {
        Self {
            event: TELEMETRY_EVENT,
            mission_id,
            data,
            analytics,
        }
    }
}

type Subscribers = HashMap<ConnectionId, mpsc::UnboundedSender<String>>;

/// Mission-channel registry.
#[derive(Default)]
pub struct Broadcaster {
    channels: RwLock<HashMap<Uuid, Subscribers>>,
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to the channel for `mission_id`. Joining a
    /// channel twice replaces the previous sender.
    pub async fn subscribe(
        &self,
        mission_id: Uuid,
        connection: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
    ) {
        let mut channels = self.channels.write().await;
        channels.entry(mission_id).or_default().insert(connection, sender);
        tracing::debug!(%mission_id, %connection, "subscribed to mission channel");
    }

    /// Remove `connection` from one mission channel.
    pub async fn unsubscribe(&self, mission_id: Uuid, connection: ConnectionId) {
        let mut channels = self.channels.write().await;
        if let Some(subscribers) = channels.get_mut(&mission_id) {
            subscribers.remove(&connection);
            if subscribers.is_empty() {
                channels.remove(&mission_id);
            }
        }
    }

    /// Remove `connection` from every channel. Called on socket close.
    pub async fn unsubscribe_all(&self, connection: ConnectionId) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, subscribers| {
            subscribers.remove(&connection);
            !subscribers.is_empty()
        });
    }

    /// Serialize `event` once and deliver it to every live subscriber
    /// of its mission channel. Closed senders are pruned. Returns the
    /// number of subscribers reached.
    pub async fn publish(&self, event: &TelemetryEvent<'_>) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::error!(%error, "failed to serialize telemetry event");
                return 0;
            }
        };

        let mut channels = self.channels.write().await;
        let Some(subscribers) = channels.get_mut(&event.mission_id) else {
            return 0;
        };

        subscribers.retain(|_, sender| sender.send(frame.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            channels.remove(&event.mission_id);
        }
        delivered
    }

    /// Number of live subscribers on one channel.
    pub async fn subscriber_count(&self, mission_id: Uuid) -> usize {
        self.channels
            .read()
            .await
            .get(&mission_id)
            .map_or(0, Subscribers::len)
    }
}
