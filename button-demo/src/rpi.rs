use anyhow::Context;
use tokio::sync::{mpsc, watch};

use thermostat_common::{shutdown, Button, RuntimeConfig};
use thermostat_peripherals::rpi::{self, GpioButton, PwmLed};

use crate::demo::{self, Demo};

pub async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&RuntimeConfig::default_path());
    let pins = &config.pins;

    let gpio = rpi::gpio().context("failed to open gpio")?;
    let red = PwmLed::new(&gpio, pins.red_led).context("failed to set up the red led")?;
    let blue = PwmLed::new(&gpio, pins.blue_led).context("failed to set up the blue led")?;

    let (press_tx, press_rx) = mpsc::unbounded_channel();
    let mut buttons = Vec::with_capacity(Button::ALL.len());
    for button in Button::ALL {
        let pin = pins.button(button);
        let mut input = GpioButton::new(&gpio, pin, button)
            .with_context(|| format!("failed to set up the {} button", button.as_str()))?;
        let tx = press_tx.clone();
        input
            .on_press(move |button| {
                let _ = tx.send(button);
            })
            .with_context(|| format!("failed to watch gpio {pin}"))?;
        buttons.push((button, input));
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    shutdown::stop_on_ctrl_c(stop_tx, std::io::stdout());

    let mut demo = Demo::new(red, blue, buttons);
    demo::run(
        &mut demo,
        press_rx,
        stop_rx,
        config.thermostat.tick_interval(),
    )
    .await
}
