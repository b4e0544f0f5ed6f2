use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;

use thermostat_common::{shutdown, Button, RuntimeConfig};
use thermostat_peripherals::host::{spawn_keyboard_buttons, ConsoleLed, LatchedButton};

use crate::demo::{self, Demo};

pub async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(&RuntimeConfig::default_path());

    let buttons: Vec<(Button, LatchedButton)> = Button::ALL
        .into_iter()
        .map(|button| (button, LatchedButton::default()))
        .collect();
    let latches = buttons.clone();

    let (press_tx, press_rx) = mpsc::unbounded_channel();
    spawn_keyboard_buttons(move |button| {
        if let Some((_, latch)) = latches.iter().find(|(known, _)| *known == button) {
            latch.press();
        }
        press_tx.send(button).is_ok()
    })
    .context("failed to start the keyboard button reader")?;
    info!("type g, r or b and enter to press a button");

    let (stop_tx, stop_rx) = watch::channel(false);
    shutdown::stop_on_ctrl_c(stop_tx, std::io::stdout());

    let mut demo = Demo::new(ConsoleLed::new("red"), ConsoleLed::new("blue"), buttons);
    demo::run(
        &mut demo,
        press_rx,
        stop_rx,
        config.thermostat.tick_interval(),
    )
    .await
}
