//! GATT session abstraction.
//!
//! Everything above the BLE library talks to a peripheral through
//! [`GattSession`], and obtains one through a [`Connector`]. The btleplug
//! implementations live here; tests substitute mocks.

use std::collections::BTreeSet;
use std::pin::Pin;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Descriptor, Peripheral as _, Service, ValueNotification};
use btleplug::platform::Peripheral;
use futures::stream::Stream;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Stream of value notifications from a connected peripheral.
pub type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// A live connection to one peripheral.
///
/// A session is exclusively owned by the caller that connected it and must
/// be released with [`GattSession::disconnect`] exactly once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattSession: Send + Sync {
    /// Address the session was opened for.
    fn address(&self) -> String;

    /// Services discovered when the session was opened.
    fn services(&self) -> BTreeSet<Service>;

    /// Read a characteristic value.
    async fn read(&self, characteristic: &Characteristic) -> Result<Vec<u8>>;

    /// Read a descriptor value.
    async fn read_descriptor(&self, descriptor: &Descriptor) -> Result<Vec<u8>>;

    /// Enable notifications on a characteristic.
    async fn subscribe(&self, characteristic: &Characteristic) -> Result<()>;

    /// Disable notifications on a characteristic.
    async fn unsubscribe(&self, characteristic: &Characteristic) -> Result<()>;

    /// Stream of notifications for every subscribed characteristic.
    async fn notifications(&self) -> Result<NotificationStream>;

    /// Release the connection.
    async fn disconnect(&self) -> Result<()>;
}

/// Opens sessions to peripherals by address.
#[cfg_attr(test, mockall::automock(type Session = MockGattSession;))]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: GattSession;

    /// Connect to the peripheral at `address` and discover its services.
    async fn connect(&self, address: &str) -> Result<Self::Session>;
}

/// [`GattSession`] over a connected btleplug peripheral.
pub struct BtleSession {
    /// The address the caller asked for.
    address: String,
    /// The connected peripheral.
    peripheral: Peripheral,
}

impl BtleSession {
    /// Wrap an already connected peripheral whose services are discovered.
    pub fn new(address: impl Into<String>, peripheral: Peripheral) -> Self {
        Self {
            address: address.into(),
            peripheral,
        }
    }
}

#[async_trait]
impl GattSession for BtleSession {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn services(&self) -> BTreeSet<Service> {
        self.peripheral.services()
    }

    async fn read(&self, characteristic: &Characteristic) -> Result<Vec<u8>> {
        let data = self
            .peripheral
            .read(characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        trace!(
            "Read {} bytes from characteristic {}",
            data.len(),
            characteristic.uuid
        );

        Ok(data)
    }

    async fn read_descriptor(&self, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let data = self
            .peripheral
            .read_descriptor(descriptor)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Read {} bytes from descriptor {}", data.len(), descriptor.uuid);

        Ok(data)
    }

    async fn subscribe(&self, characteristic: &Characteristic) -> Result<()> {
        debug!(
            "Subscribing to {}, properties: {:?}",
            characteristic.uuid, characteristic.properties
        );

        self.peripheral
            .subscribe(characteristic)
            .await
            .map_err(Error::Bluetooth)
    }

    async fn unsubscribe(&self, characteristic: &Characteristic) -> Result<()> {
        self.peripheral
            .unsubscribe(characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        debug!("Unsubscribed from notifications from {}", characteristic.uuid);

        Ok(())
    }

    async fn notifications(&self) -> Result<NotificationStream> {
        self.peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral
            .disconnect()
            .await
            .map_err(Error::Bluetooth)
    }
}
