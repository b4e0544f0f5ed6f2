//! Desktop build: buttons are typed on stdin, status reports go to stdout and
//! the LEDs and LCD show up in the log.

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;

use thermostat_common::{shutdown, RuntimeConfig};
use thermostat_peripherals::host::{
    spawn_keyboard_buttons, ConsoleDisplay, ConsoleLed, SimulatedSensor, StreamSerial,
};

use crate::runner::{self, Controller, Devices};

pub async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&RuntimeConfig::default_path());

    let (button_tx, button_rx) = mpsc::unbounded_channel();
    spawn_keyboard_buttons(move |button| button_tx.send(button).is_ok())
        .context("failed to start the keyboard button reader")?;
    info!("buttons: g cycles the mode, r raises the setpoint, b lowers it");

    let (stop_tx, stop_rx) = watch::channel(false);
    // stdout may be carrying status reports.
    shutdown::stop_on_ctrl_c(stop_tx, std::io::stderr());

    let mut controller = Controller::new(
        &config.thermostat,
        Devices {
            sensor: SimulatedSensor::default(),
            display: ConsoleDisplay::new(config.pins.lcd.columns),
            serial: StreamSerial::stdout(),
            red: ConsoleLed::new("red"),
            blue: ConsoleLed::new("blue"),
        },
    );
    info!(
        setpoint = config.thermostat.initial_setpoint_f,
        "simulated thermostat running"
    );
    runner::run(
        &mut controller,
        button_rx,
        stop_rx,
        config.thermostat.tick_interval(),
    )
    .await
}
