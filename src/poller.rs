//! Polling reader.
//!
//! Reads every sensor characteristic on a fixed interval and prints the
//! decoded values until shut down or a read cycle fails.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::ble::resolver::resolve;
use crate::ble::session::GattSession;
use crate::ble::uuids::ESS_SERVICE_UUID;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::Result;
use crate::output::Output;
use crate::sensor::{Reading, SensorKind};

/// Periodically reads the four ESS characteristics.
pub struct PollingReader<'a, S: GattSession + ?Sized> {
    /// The session to read from.
    session: &'a S,
    /// Delay between cycles.
    interval: Duration,
}

impl<'a, S: GattSession + ?Sized> PollingReader<'a, S> {
    /// Create a reader with the default interval.
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the delay between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Resolve, read and decode every sensor once.
    ///
    /// # Errors
    ///
    /// The first characteristic that cannot be resolved, read or decoded
    /// aborts the whole cycle.
    pub async fn poll_once(&self) -> Result<Vec<Reading>> {
        let services = self.session.services();
        let mut readings = Vec::with_capacity(SensorKind::ALL.len());

        for kind in SensorKind::ALL {
            let uuid = kind.uuid();
            let characteristic = resolve(&services, &ESS_SERVICE_UUID, &uuid).into_result(&uuid)?;
            let data = self.session.read(&characteristic).await?;
            let reading = kind.decode(&data)?;

            debug!("{} raw {:02X?} -> {}", kind, data, reading.value);
            readings.push(reading);
        }

        Ok(readings)
    }

    /// Poll forever, printing each cycle, until `shutdown` resolves.
    ///
    /// Returns `Ok(())` on shutdown, or the error that ended a cycle.
    pub async fn run<F>(&self, output: &Output, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let readings = tokio::select! {
                _ = &mut shutdown => break,
                readings = self.poll_once() => readings?,
            };

            for reading in &readings {
                output.line(reading)?;
            }
            output.blank()?;

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Polling stopped");
        Ok(())
    }
}
