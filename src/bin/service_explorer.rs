//! Print every service, characteristic and descriptor on a peripheral.
//!
//! Run with: cargo run --bin service_explorer -- <BLUETOOTH_ADDRESS>

use std::process::ExitCode;

use ess_sensor_ble::cli::{self, Script};
use ess_sensor_ble::{BtleConnector, Config, Output};

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();

    let config = Config::from_env();
    let connector = BtleConnector::new(&config);

    let status = cli::run(
        Script::Explore,
        std::env::args(),
        &connector,
        &config,
        &Output::stdout(),
        // Ctrl+C abandons the walk; the session is still disconnected.
        cli::ctrl_c(),
    )
    .await;

    ExitCode::from(status)
}
