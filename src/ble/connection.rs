//! BLE connection management.
//!
//! Handles finding a peripheral by address and opening a session to it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ble::session::{BtleSession, Connector};
use crate::config::Config;
use crate::error::{Error, Result};

/// How often the adapter's peripheral list is checked while scanning.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Lifecycle state of a session used for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No session, or the session has been torn down.
    #[default]
    Disconnected,
    /// Session open, no notifications enabled yet.
    Connected,
    /// At least one characteristic has notifications enabled.
    Subscribed,
    /// Every sensor characteristic is subscribed and notifications are being dispatched.
    Listening,
}

impl ConnectionState {
    /// Check if a session is open.
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// Check if notifications are being dispatched.
    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Subscribed => write!(f, "Subscribed"),
            Self::Listening => write!(f, "Listening"),
        }
    }
}

/// Check whether a peripheral matches the address the user asked for.
///
/// Linux and Windows report a MAC address; macOS only exposes an opaque
/// peripheral id, so either is accepted.
pub fn matches_address(wanted: &str, address: &str, id: &str) -> bool {
    let wanted = wanted.trim();
    !wanted.is_empty() && (wanted.eq_ignore_ascii_case(address) || wanted.eq_ignore_ascii_case(id))
}

/// Run one phase of a connection attempt against the attempt's deadline.
///
/// Every phase shares the same `deadline`, so the attempt as a whole never
/// outlasts it. Running out of time is reported as
/// [`Error::ConnectionTimeout`] for `address`.
pub async fn before_deadline<T, F>(deadline: Instant, address: &str, phase: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout_at(deadline, phase).await {
        Ok(result) => result,
        Err(_) => Err(Error::ConnectionTimeout {
            address: address.to_string(),
        }),
    }
}

/// [`Connector`] backed by the first btleplug adapter on the system.
pub struct BtleConnector {
    /// Connect deadline.
    connect_timeout: Duration,
}

impl BtleConnector {
    /// Create a connector using the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
        }
    }

    /// Get the first Bluetooth adapter.
    async fn adapter() -> Result<Adapter> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(adapter)
    }

    /// Scan until a peripheral with the wanted address shows up.
    async fn find(adapter: &Adapter, address: &str) -> Result<Peripheral> {
        loop {
            for peripheral in adapter.peripherals().await.map_err(Error::Bluetooth)? {
                let id = peripheral.id().to_string();
                let peripheral_address = peripheral.address().to_string();

                if matches_address(address, &peripheral_address, &id) {
                    debug!("Found peripheral {} ({})", peripheral_address, id);
                    return Ok(peripheral);
                }
            }

            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        }
    }

    /// Connect and discover services, tearing the link down if discovery fails.
    async fn open(peripheral: &Peripheral) -> Result<()> {
        if !peripheral.is_connected().await.unwrap_or(false) {
            peripheral.connect().await.map_err(|e| Error::ConnectionFailed {
                reason: e.to_string(),
            })?;
        }

        if let Err(e) = peripheral.discover_services().await {
            warn!("Failed to discover services: {}", e);
            if let Err(e) = peripheral.disconnect().await {
                warn!("Failed to disconnect after discovery error: {}", e);
            }
            return Err(Error::Bluetooth(e));
        }

        Ok(())
    }
}

impl Default for BtleConnector {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[async_trait]
impl Connector for BtleConnector {
    type Session = BtleSession;

    async fn connect(&self, address: &str) -> Result<BtleSession> {
        let deadline = Instant::now() + self.connect_timeout;
        let adapter = Self::adapter().await?;

        info!("Scanning for {}", address);

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let found = before_deadline(deadline, address, Self::find(&adapter, address)).await;

        if let Err(e) = adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }

        let peripheral = found?;

        if let Err(e) = before_deadline(deadline, address, Self::open(&peripheral)).await {
            if matches!(e, Error::ConnectionTimeout { .. }) {
                // The connect may have completed right at the deadline.
                if let Err(e) = peripheral.disconnect().await {
                    warn!("Failed to disconnect after connect timeout: {}", e);
                }
            }
            return Err(e);
        }

        info!("Connected to {}", address);

        Ok(BtleSession::new(address, peripheral))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::Subscribed.is_connected());
        assert!(ConnectionState::Listening.is_connected());

        assert!(ConnectionState::Listening.is_listening());
        assert!(!ConnectionState::Subscribed.is_listening());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Listening), "Listening");
        assert_eq!(format!("{}", ConnectionState::Disconnected), "Disconnected");
    }

    #[test]
    fn test_matches_address() {
        assert!(matches_address(
            "aa:bb:cc:dd:ee:ff",
            "AA:BB:CC:DD:EE:FF",
            "hci0/dev_AA_BB_CC_DD_EE_FF"
        ));
        assert!(matches_address(
            "3B9F1C0A-7E55-4C8E-9E1E-0D2E7A1B9C44",
            "00:00:00:00:00:00",
            "3b9f1c0a-7e55-4c8e-9e1e-0d2e7a1b9c44"
        ));
        assert!(!matches_address("AA:BB:CC:DD:EE:00", "AA:BB:CC:DD:EE:FF", "x"));
        assert!(!matches_address("", "", ""));
    }

    #[tokio::test]
    async fn test_phases_share_one_deadline() {
        let deadline = Instant::now() + Duration::from_millis(200);
        let phase = || async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            Ok(())
        };

        // Each phase fits the timeout alone, but not both together.
        tokio_test::assert_ok!(before_deadline(deadline, "AA:BB:CC:DD:EE:FF", phase()).await);
        let second = before_deadline(deadline, "AA:BB:CC:DD:EE:FF", phase()).await;

        match second {
            Err(Error::ConnectionTimeout { address }) => assert_eq!(address, "AA:BB:CC:DD:EE:FF"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_phase_errors_pass_through() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let result: Result<()> =
            before_deadline(deadline, "AA:BB:CC:DD:EE:FF", async { Err(Error::ConnectionLost) })
                .await;
        assert!(matches!(result, Err(Error::ConnectionLost)));
    }
}
