//! BLE communication module.
//!
//! This module provides the thin layer between the sensor tools and the
//! BLE library: connecting, the session seam, and characteristic lookup.

pub mod connection;
pub mod resolver;
pub mod session;
pub mod uuids;

pub use connection::{BtleConnector, ConnectionState};
pub use resolver::{resolve, Resolution};
pub use session::{BtleSession, Connector, GattSession, NotificationStream};
pub use uuids::*;
