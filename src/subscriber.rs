//! Notification subscriber.
//!
//! Subscribes to every sensor characteristic and dispatches each incoming
//! notification to the callback registered for that sensor.
//!
//! ```text
//! Disconnected -> Connected -> Subscribed -> Listening -> Disconnected
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use btleplug::api::Characteristic;
use futures::stream::StreamExt;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::connection::ConnectionState;
use crate::ble::resolver::resolve;
use crate::ble::session::{GattSession, NotificationStream};
use crate::ble::uuids::ESS_SERVICE_UUID;
use crate::error::{Error, Result};
use crate::sensor::{Reading, SensorKind};

/// Callback invoked with each decoded reading.
///
/// Runs inline on the listening task; it must return quickly.
pub type ReadingCallback = Arc<dyn Fn(&Reading) + Send + Sync>;

/// Subscribes to sensor notifications on one session.
pub struct Subscriber<'a, S: GattSession + ?Sized> {
    /// The session notifications arrive on.
    session: &'a S,
    /// Current lifecycle state.
    state: ConnectionState,
    /// Callbacks by sensor.
    callbacks: HashMap<SensorKind, ReadingCallback>,
    /// Characteristics with notifications enabled.
    subscribed: Vec<Characteristic>,
    /// Notifications received since the first subscription.
    notifications: Option<NotificationStream>,
}

impl<'a, S: GattSession + ?Sized> Subscriber<'a, S> {
    /// Create a subscriber over an open session.
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            state: ConnectionState::Connected,
            callbacks: HashMap::new(),
            subscribed: Vec::new(),
            notifications: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Register the callback for one sensor, replacing any previous one.
    pub fn on_reading<F>(&mut self, kind: SensorKind, callback: F)
    where
        F: Fn(&Reading) + Send + Sync + 'static,
    {
        self.callbacks.insert(kind, Arc::new(callback));
    }

    /// Register the same callback for every sensor.
    pub fn on_any_reading<F>(&mut self, callback: F)
    where
        F: Fn(&Reading) + Send + Sync + 'static,
    {
        let callback: ReadingCallback = Arc::new(callback);
        for kind in SensorKind::ALL {
            self.callbacks.insert(kind, callback.clone());
        }
    }

    /// Enable notifications on all four sensor characteristics.
    ///
    /// The notification stream is opened before the first subscription, so
    /// values pushed as soon as a CCCD is written reach [`Self::listen`].
    ///
    /// # Errors
    ///
    /// The first characteristic that cannot be resolved or subscribed ends
    /// the attempt; there is no retry.
    pub async fn subscribe_all(&mut self) -> Result<()> {
        if !self.state().is_connected() {
            return Err(Error::ConnectionLost);
        }

        let services = self.session.services();

        if self.notifications.is_none() {
            self.notifications = Some(self.session.notifications().await?);
        }

        for kind in SensorKind::ALL {
            let uuid = kind.uuid();
            let characteristic = resolve(&services, &ESS_SERVICE_UUID, &uuid).into_result(&uuid)?;

            self.session.subscribe(&characteristic).await?;
            debug!("Subscribed to {} ({})", kind, uuid);

            self.subscribed.push(characteristic);
            self.set_state(ConnectionState::Subscribed);
        }

        self.set_state(ConnectionState::Listening);
        Ok(())
    }

    /// Dispatch notifications until `shutdown` resolves.
    ///
    /// Each notification for a sensor characteristic is decoded and handed
    /// to that sensor's callback exactly once. Undecodable payloads and
    /// unknown characteristics are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`] if the notification stream ends
    /// before shutdown.
    pub async fn listen<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let notifications = match self.state() {
            ConnectionState::Listening => self.notifications.take(),
            _ => None,
        };
        let Some(mut notifications) = notifications else {
            return Err(Error::NotSupported {
                operation: format!("listen while {}", self.state()),
            });
        };
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                notification = notifications.next() => match notification {
                    Some(notification) => self.dispatch(&notification.uuid, &notification.value),
                    None => {
                        warn!("Notification stream closed");
                        break Err(Error::ConnectionLost);
                    }
                },
            }
        };

        self.teardown().await;
        result
    }

    /// Decode one notification and invoke its callback.
    fn dispatch(&self, uuid: &Uuid, value: &[u8]) {
        trace!("Notification from {}: {:02X?}", uuid, value);

        let Some(kind) = SensorKind::from_uuid(uuid) else {
            debug!("Ignoring notification from unknown characteristic {}", uuid);
            return;
        };

        match kind.decode(value) {
            Ok(reading) => {
                if let Some(callback) = self.callbacks.get(&kind) {
                    callback(&reading);
                }
            }
            Err(e) => warn!("Skipping {} notification: {}", kind, e),
        }
    }

    /// Disable notifications and mark the subscriber disconnected.
    pub async fn teardown(&mut self) {
        for characteristic in self.subscribed.drain(..) {
            if let Err(e) = self.session.unsubscribe(&characteristic).await {
                debug!("Failed to unsubscribe from {}: {}", characteristic.uuid, e);
            }
        }

        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&mut self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut self.state, new_state);

        if old_state != new_state {
            debug!("Subscriber state changed: {} -> {}", old_state, new_state);
        }
    }
}
