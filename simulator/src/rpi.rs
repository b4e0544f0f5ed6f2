use anyhow::Context;
use tracing::info;

use thermostat_common::RuntimeConfig;
use thermostat_peripherals::rpi::SerialPort;

use crate::echo;

pub async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&RuntimeConfig::default_path());
    let serial = config.serial;
    let timeout = serial.read_timeout();
    info!(port = %serial.simulator_port, baud = serial.baud_rate, "listening");

    echo::serve(
        move || {
            SerialPort::open(&serial.simulator_port, serial.baud_rate, timeout)
                .with_context(|| format!("failed to open {}", serial.simulator_port))
        },
        std::io::stdout(),
        tokio::signal::ctrl_c(),
        timeout * 2,
    )
    .await
}
