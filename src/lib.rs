// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # ess-sensor-ble
//!
//! A small Rust library and tool set for reading Bluetooth Low Energy
//! peripherals that expose the standard Environmental Sensing Service
//! (temperature, pressure, humidity and illuminance).
//!
//! GATT handling, connection management and pairing are left to
//! [`btleplug`]; this crate resolves the sensor characteristics, decodes
//! their little-endian payloads and prints them.
//!
//! ## Tools
//!
//! - `read_characteristic <ADDRESS>`: poll all four sensors every 5 seconds
//! - `get_notification <ADDRESS>`: subscribe and print values as they are pushed
//! - `service_explorer <ADDRESS>`: dump every service, characteristic and descriptor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ess_sensor_ble::{BtleConnector, Config, Connector, GattSession, PollingReader, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default();
//!     let session = BtleConnector::new(&config).connect("AA:BB:CC:DD:EE:FF").await?;
//!
//!     for reading in PollingReader::new(&session).poll_once().await? {
//!         println!("{}", reading);
//!     }
//!
//!     session.disconnect().await
//! }
//! ```
//!
//! ## Configuration
//!
//! - `ESS_CONNECT_TIMEOUT_SECS`: scan and connect deadline (default 10)
//! - `ESS_POLL_INTERVAL_SECS`: delay between polling cycles (default 5)
//! - `RUST_LOG`: log filter for the tools, logs go to stderr (default `warn`)
//!
//! ## Platform Notes
//!
//! ### macOS
//! Peripherals are addressed by their CoreBluetooth identifier rather than
//! a MAC address. Requires Bluetooth permission.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for readings

// Public modules
pub mod ble;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod output;
pub mod poller;
pub mod protocol;
pub mod sensor;
pub mod subscriber;

// Re-exports for convenience
pub use ble::connection::{BtleConnector, ConnectionState};
pub use ble::resolver::Resolution;
pub use ble::session::{BtleSession, Connector, GattSession};
pub use config::Config;
pub use error::{Error, Result};
pub use explorer::{explore, ExploreSummary};
pub use output::Output;
pub use poller::PollingReader;
pub use protocol::{Sample, Signedness};
pub use sensor::{Reading, SensorKind};
pub use subscriber::Subscriber;
