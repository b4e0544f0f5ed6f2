//! Desktop build: the "serial port" is stdin, so the controller can be piped
//! straight in.

use std::time::Duration;

use thermostat_peripherals::host::StreamLineSource;

use crate::echo;

pub async fn run() -> anyhow::Result<()> {
    echo::serve(
        || Ok(StreamLineSource::stdin()),
        std::io::stdout(),
        tokio::signal::ctrl_c(),
        Duration::from_secs(1),
    )
    .await
}
