//! Read the four ESS sensor characteristics every few seconds.
//!
//! Run with: cargo run --bin read_characteristic -- <BLUETOOTH_ADDRESS>

use std::process::ExitCode;

use ess_sensor_ble::cli::{self, Script};
use ess_sensor_ble::{BtleConnector, Config, Output};

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_logging();

    let config = Config::from_env();
    let connector = BtleConnector::new(&config);

    let status = cli::run(
        Script::Read,
        std::env::args(),
        &connector,
        &config,
        &Output::stdout(),
        cli::ctrl_c(),
    )
    .await;

    ExitCode::from(status)
}
