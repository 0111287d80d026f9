//! Subscribe to ESS sensor notifications and print each value as it arrives.
//!
//! Run with: cargo run --bin get_notification -- <BLUETOOTH_ADDRESS>

use std::process::ExitCode;

use ess_sensor_ble::cli::{self, Script};
use ess_sensor_ble::{BtleConnector, Config, Output};

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();

    let config = Config::from_env();
    let connector = BtleConnector::new(&config);

    let status = cli::run(
        Script::Notify,
        std::env::args(),
        &connector,
        &config,
        &Output::stdout(),
        // Ctrl+C ends listening; notifications are disabled before disconnecting.
        cli::ctrl_c(),
    )
    .await;

    ExitCode::from(status)
}
