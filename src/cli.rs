//! Command-line front end shared by the three tools.
//!
//! Each tool takes exactly one argument, the peripheral address, opens one
//! session, runs its script against it and always disconnects afterwards.

use std::future::Future;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ble::session::{Connector, GattSession};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::explorer::explore;
use crate::output::Output;
use crate::poller::PollingReader;
use crate::subscriber::Subscriber;

/// Message printed under the usage line.
pub const ADDRESS_HINT: &str = "Please specify the Bluetooth address.";

/// What a tool does once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Poll the sensor characteristics on an interval.
    Read,
    /// Subscribe to sensor notifications.
    Notify,
    /// Print the whole GATT table.
    Explore,
}

/// Extract the single address argument.
///
/// `args` includes the program name, as from [`std::env::args`].
///
/// # Errors
///
/// Returns [`Error::Usage`] unless exactly one argument follows the program name.
pub fn parse_address<I>(args: I) -> Result<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| "ess-sensor".to_string());

    match (args.next(), args.next()) {
        (Some(address), None) if !address.trim().is_empty() => Ok(address),
        _ => Err(Error::Usage { program }),
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves when the process receives Ctrl+C.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run `script` against the session, then disconnect exactly once.
///
/// `shutdown` ends every script early, including an explorer walk stuck on
/// a slow read.
pub async fn run_script<S, F>(
    script: Script,
    session: &S,
    config: &Config,
    output: &Output,
    shutdown: F,
) -> Result<()>
where
    S: GattSession + ?Sized,
    F: Future<Output = ()>,
{
    let result = match script {
        Script::Read => {
            PollingReader::new(session)
                .with_interval(config.poll_interval)
                .run(output, shutdown)
                .await
        }
        Script::Notify => notify(session, output, shutdown).await,
        Script::Explore => tokio::select! {
            explored = explore(session, output) => explored.map(|_| ()),
            _ = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
        },
    };

    release(session).await;
    result
}

async fn release<S: GattSession + ?Sized>(session: &S) {
    debug!("Releasing session to {}", session.address());
    if let Err(e) = session.disconnect().await {
        warn!("Failed to disconnect: {}", e);
    }
}

async fn notify<S, F>(session: &S, output: &Output, shutdown: F) -> Result<()>
where
    S: GattSession + ?Sized,
    F: Future<Output = ()>,
{
    output.line(format_args!("Connected to address: {}", session.address()))?;

    let mut subscriber = Subscriber::new(session);
    let sink = output.clone();
    subscriber.on_any_reading(move |reading| {
        if let Err(e) = sink.line(reading) {
            warn!("Failed to print reading: {}", e);
        }
    });

    subscriber.subscribe_all().await?;
    output.line("Notifications started...")?;

    subscriber.listen(shutdown).await
}

/// Full tool entry point: parse arguments, connect, run, report.
///
/// Every failure is reported on `output`; the returned value is the
/// process exit status. `shutdown` is watched from the start of the
/// connection attempt: if it fires first, the attempt is still allowed to
/// finish so a session that came up is released.
pub async fn run<C, I, F>(
    script: Script,
    args: I,
    connector: &C,
    config: &Config,
    output: &Output,
    shutdown: F,
) -> u8
where
    C: Connector,
    I: IntoIterator<Item = String>,
    F: Future<Output = ()>,
{
    let address = match parse_address(args) {
        Ok(address) => address,
        Err(e) => {
            let _ = output.line(&e);
            let _ = output.line(ADDRESS_HINT);
            return e.exit_code();
        }
    };

    let connect = connector.connect(&address);
    tokio::pin!(connect);
    tokio::pin!(shutdown);

    let result = tokio::select! {
        connected = &mut connect => match connected {
            Ok(session) => run_script(script, &session, config, output, &mut shutdown).await,
            Err(e) => Err(e),
        },
        _ = &mut shutdown => {
            info!("Shutdown requested while connecting");
            if let Ok(session) = connect.await {
                release(&session).await;
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => 0,
        Err(e @ Error::ConnectionTimeout { .. }) => {
            let _ = output.line(&e);
            e.exit_code()
        }
        Err(e) => {
            let _ = output.line(format_args!("Error: {}", e));
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::resolver::tests::service;
    use crate::ble::session::{MockConnector, MockGattSession, NotificationStream};
    use crate::ble::uuids::*;
    use crate::output::Capture;
    use btleplug::api::{Characteristic, Descriptor, Service, ValueNotification};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    /// Session whose reads never complete, counting disconnects.
    struct StalledSession {
        disconnects: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl GattSession for StalledSession {
        fn address(&self) -> String {
            ADDRESS.to_string()
        }

        fn services(&self) -> BTreeSet<Service> {
            BTreeSet::from([service(ESS_SERVICE_UUID, &[TEMPERATURE_UUID])])
        }

        async fn read(&self, _characteristic: &Characteristic) -> Result<Vec<u8>> {
            std::future::pending().await
        }

        async fn read_descriptor(&self, _descriptor: &Descriptor) -> Result<Vec<u8>> {
            std::future::pending().await
        }

        async fn subscribe(&self, _characteristic: &Characteristic) -> Result<()> {
            Ok(())
        }

        async fn unsubscribe(&self, _characteristic: &Characteristic) -> Result<()> {
            Ok(())
        }

        async fn notifications(&self) -> Result<NotificationStream> {
            let stream: NotificationStream =
                Box::pin(futures::stream::pending::<ValueNotification>());
            Ok(stream)
        }

        async fn disconnect(&self) -> Result<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Connector that needs more than one poll to come up.
    struct SlowConnector {
        disconnects: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Connector for SlowConnector {
        type Session = StalledSession;

        async fn connect(&self, _address: &str) -> Result<StalledSession> {
            tokio::task::yield_now().await;
            Ok(StalledSession {
                disconnects: self.disconnects.clone(),
            })
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address(args(&["read_characteristic", ADDRESS])).unwrap(),
            ADDRESS
        );
        assert!(matches!(
            parse_address(args(&["read_characteristic"])),
            Err(Error::Usage { .. })
        ));
        assert!(matches!(
            parse_address(args(&["read_characteristic", ADDRESS, "extra"])),
            Err(Error::Usage { .. })
        ));
        assert!(matches!(
            parse_address(args(&["read_characteristic", " "])),
            Err(Error::Usage { .. })
        ));
        assert!(parse_address(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_usage_error_never_connects() {
        for script in [Script::Read, Script::Notify, Script::Explore] {
            for argv in [args(&["tool"]), args(&["tool", ADDRESS, "AA:BB"])] {
                let mut connector = MockConnector::new();
                connector.expect_connect().never();

                let capture = Capture::default();
                let status = run(
                    script,
                    argv,
                    &connector,
                    &Config::default(),
                    &capture.output(),
                    async {},
                )
                .await;

                assert_eq!(status, 2);
                assert_eq!(
                    capture.lines(),
                    vec!["Usage: tool <BLUETOOTH_ADDRESS>", ADDRESS_HINT]
                );
            }
        }
    }

    #[tokio::test]
    async fn test_connect_timeout_reports_address() {
        let mut connector = MockConnector::new();
        connector.expect_connect().times(1).returning(|address| {
            Err(Error::ConnectionTimeout {
                address: address.to_string(),
            })
        });

        let capture = Capture::default();
        let status = run(
            Script::Read,
            args(&["read_characteristic", ADDRESS]),
            &connector,
            &Config::default(),
            &capture.output(),
            std::future::pending(),
        )
        .await;

        assert_eq!(status, 1);
        assert!(capture.contents().contains(ADDRESS));
    }

    #[tokio::test]
    async fn test_read_prints_temperature_and_disconnects_once() {
        let mut connector = MockConnector::new();
        connector.expect_connect().times(1).returning(|_| {
            let mut session = MockGattSession::new();
            session.expect_address().return_const(ADDRESS.to_string());
            session.expect_services().returning(|| {
                BTreeSet::from([service(
                    ESS_SERVICE_UUID,
                    &[TEMPERATURE_UUID, PRESSURE_UUID, HUMIDITY_UUID, ILLUMINANCE_UUID],
                )])
            });
            session.expect_read().returning(|c| {
                if c.uuid == TEMPERATURE_UUID {
                    Ok(vec![0x0A, 0x00])
                } else {
                    Ok(vec![0x00, 0x00])
                }
            });
            session.expect_disconnect().times(1).returning(|| Ok(()));
            Ok(session)
        });

        let capture = Capture::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };
        let stop = async move {
            tokio::task::yield_now().await;
            let _ = tx.send(());
        };

        let config = Config::default();
        let output = capture.output();
        let (status, _) = tokio::join!(
            run(
                Script::Read,
                args(&["read_characteristic", ADDRESS]),
                &connector,
                &config,
                &output,
                shutdown,
            ),
            stop
        );

        assert_eq!(status, 0);
        assert!(capture
            .lines()
            .contains(&"Temperature Level: 10 deg C".to_string()));
    }

    #[tokio::test]
    async fn test_failed_script_still_disconnects() {
        let mut session = MockGattSession::new();
        session.expect_address().return_const(ADDRESS.to_string());
        session.expect_services().returning(BTreeSet::new);
        session.expect_disconnect().times(1).returning(|| Ok(()));

        let capture = Capture::default();
        let result = run_script(
            Script::Read,
            &session,
            &Config::default(),
            &capture.output(),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(Error::CharacteristicNotFound { .. })));
    }

    #[tokio::test]
    async fn test_notify_prints_banner_and_readings() {
        let mut session = MockGattSession::new();
        session.expect_address().return_const(ADDRESS.to_string());
        session.expect_services().returning(|| {
            BTreeSet::from([service(
                ESS_SERVICE_UUID,
                &[TEMPERATURE_UUID, PRESSURE_UUID, HUMIDITY_UUID, ILLUMINANCE_UUID],
            )])
        });
        session.expect_subscribe().times(4).returning(|_| Ok(()));
        session.expect_unsubscribe().times(4).returning(|_| Ok(()));
        session.expect_notifications().return_once(|| {
            let stream: crate::ble::session::NotificationStream =
                Box::pin(futures::stream::iter(vec![
                    btleplug::api::ValueNotification {
                        uuid: TEMPERATURE_UUID,
                        value: vec![0x0A, 0x00, 0x00, 0x00],
                    },
                ]));
            Ok(stream)
        });
        session.expect_disconnect().times(1).returning(|| Ok(()));

        let capture = Capture::default();
        let result = run_script(
            Script::Notify,
            &session,
            &Config::default(),
            &capture.output(),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(Error::ConnectionLost)));
        assert_eq!(
            capture.lines(),
            vec![
                "Connected to address: AA:BB:CC:DD:EE:FF",
                "Notifications started...",
                "Temperature Level: 10 deg C",
            ]
        );
    }

    #[tokio::test]
    async fn test_explore_disconnects_after_walk() {
        let mut session = MockGattSession::new();
        session.expect_address().return_const(ADDRESS.to_string());
        session.expect_services().returning(BTreeSet::new);
        session.expect_disconnect().times(1).returning(|| Ok(()));

        let capture = Capture::default();
        let result = run_script(
            Script::Explore,
            &session,
            &Config::default(),
            &capture.output(),
            async {},
        )
        .await;

        tokio_test::assert_ok!(result);
        assert_eq!(capture.contents(), "");
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_a_stalled_explore() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let session = StalledSession {
            disconnects: disconnects.clone(),
        };

        let capture = Capture::default();
        let result = run_script(
            Script::Explore,
            &session,
            &Config::default(),
            &capture.output(),
            async {},
        )
        .await;

        tokio_test::assert_ok!(result);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_while_connecting_releases_the_session() {
        for script in [Script::Read, Script::Notify, Script::Explore] {
            let disconnects = Arc::new(AtomicUsize::new(0));
            let connector = SlowConnector {
                disconnects: disconnects.clone(),
            };

            let capture = Capture::default();
            let status = run(
                script,
                args(&["tool", ADDRESS]),
                &connector,
                &Config::default(),
                &capture.output(),
                async {},
            )
            .await;

            assert_eq!(status, 0);
            assert_eq!(disconnects.load(Ordering::SeqCst), 1);
            assert_eq!(capture.contents(), "");
        }
    }
}
