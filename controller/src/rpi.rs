//! Breadboard build: GPIO LEDs and buttons, HD44780 LCD, AHT20 sensor and the
//! Pi's UART.

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;

use thermostat_common::{shutdown, Button, RuntimeConfig};
use thermostat_peripherals::rpi::{self, Aht20, GpioButton, Hd44780, PwmLed, SerialPort};

use crate::runner::{self, Controller, Devices};

pub async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&RuntimeConfig::default_path());
    let pins = &config.pins;

    let gpio = rpi::gpio().context("failed to open gpio")?;
    let red = PwmLed::new(&gpio, pins.red_led).context("failed to set up the red led")?;
    let blue = PwmLed::new(&gpio, pins.blue_led).context("failed to set up the blue led")?;
    let display = Hd44780::new(&gpio, &pins.lcd).context("failed to set up the lcd")?;
    let sensor =
        Aht20::new(config.sensor.i2c_address).context("failed to set up the aht20 sensor")?;
    let serial = SerialPort::open(
        &config.serial.controller_port,
        config.serial.baud_rate,
        config.serial.read_timeout(),
    )
    .with_context(|| format!("failed to open {}", config.serial.controller_port))?;

    let (button_tx, button_rx) = mpsc::unbounded_channel();
    let mut buttons = Vec::with_capacity(Button::ALL.len());
    for button in Button::ALL {
        let pin = pins.button(button);
        let mut input = GpioButton::new(&gpio, pin, button)
            .with_context(|| format!("failed to set up the {} button", button.as_str()))?;
        let tx = button_tx.clone();
        input
            .on_press(move |button| {
                let _ = tx.send(button);
            })
            .with_context(|| format!("failed to watch gpio {pin}"))?;
        buttons.push(input);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    // stdout may be carrying status reports.
    shutdown::stop_on_ctrl_c(stop_tx, std::io::stderr());

    let mut controller = Controller::new(
        &config.thermostat,
        Devices {
            sensor,
            display,
            serial,
            red,
            blue,
        },
    );
    info!(
        setpoint = config.thermostat.initial_setpoint_f,
        port = %config.serial.controller_port,
        "thermostat running"
    );
    let result = runner::run(
        &mut controller,
        button_rx,
        stop_rx,
        config.thermostat.tick_interval(),
    )
    .await;
    drop(buttons);
    result
}
