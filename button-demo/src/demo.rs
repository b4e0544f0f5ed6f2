//! Three buttons switching two LEDs between "both solid", "red fading" and
//! "blue fading", plus a once-a-second poll that logs held buttons.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use thermostat_common::{
    demo::{demo_actions, demo_description},
    Button, EngineAction, Indicator, PushButton,
};

pub struct Demo<L, P> {
    red: L,
    blue: L,
    buttons: Vec<(Button, P)>,
}

impl<L: Indicator, P: PushButton> Demo<L, P> {
    pub fn new(red: L, blue: L, buttons: Vec<(Button, P)>) -> Self {
        Self { red, blue, buttons }
    }

    pub fn press(&mut self, button: Button) -> anyhow::Result<()> {
        info!("{}", demo_description(button));
        for action in demo_actions(button) {
            match action {
                EngineAction::Red(output) => self
                    .red
                    .apply(output)
                    .context("failed to drive the red led")?,
                EngineAction::Blue(output) => self
                    .blue
                    .apply(output)
                    .context("failed to drive the blue led")?,
                EngineAction::RefreshLights => {}
            }
        }
        Ok(())
    }

    /// Buttons held down right now.
    pub fn poll(&self) -> Vec<Button> {
        let held: Vec<Button> = self
            .buttons
            .iter()
            .filter(|(_, input)| input.is_pressed())
            .map(|(button, _)| *button)
            .collect();
        for button in &held {
            info!("{} button pressed", button.as_str());
        }
        held
    }

    /// Turns both LEDs off, trying the blue one even if the red one fails.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        let red = self.red.off().context("failed to turn off the red led");
        let blue = self.blue.off().context("failed to turn off the blue led");
        if let (Err(_), Err(err)) = (&red, &blue) {
            warn!("{err:#}");
        }
        red.and(blue)
    }
}

/// Applies presses as they arrive and polls the buttons every `period` until
/// `stop` turns true. Both LEDs are switched off on the way out.
pub async fn run<L: Indicator, P: PushButton>(
    demo: &mut Demo<L, P>,
    mut presses: mpsc::UnboundedReceiver<Button>,
    mut stop: watch::Receiver<bool>,
    period: Duration,
) -> anyhow::Result<()> {
    let mut poll = tokio::time::interval(period);

    let outcome = async {
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                Some(button) = presses.recv() => demo.press(button)?,
                _ = poll.tick() => {
                    demo.poll();
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        anyhow::Ok(())
    }
    .await;

    debug!("button demo stopped");
    match (outcome, demo.shutdown()) {
        (Ok(()), cleanup) => cleanup,
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup)) => {
            warn!("cleanup after failure also failed: {cleanup:#}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use thermostat_common::{hal::DeviceResult, LightOutput};

    #[derive(Default)]
    struct FakeLed {
        history: Vec<LightOutput>,
    }

    impl FakeLed {
        fn current(&self) -> LightOutput {
            self.history.last().copied().unwrap_or(LightOutput::Off)
        }
    }

    impl Indicator for FakeLed {
        fn on(&mut self) -> DeviceResult<()> {
            self.history.push(LightOutput::On);
            Ok(())
        }

        fn off(&mut self) -> DeviceResult<()> {
            self.history.push(LightOutput::Off);
            Ok(())
        }

        fn pulse(&mut self) -> DeviceResult<()> {
            self.history.push(LightOutput::Pulse);
            Ok(())
        }
    }

    #[derive(Default)]
    struct HeldButton(Cell<bool>);

    impl PushButton for HeldButton {
        fn is_pressed(&self) -> bool {
            self.0.get()
        }
    }

    fn demo() -> Demo<FakeLed, HeldButton> {
        let buttons = Button::ALL
            .into_iter()
            .map(|button| (button, HeldButton::default()))
            .collect();
        Demo::new(FakeLed::default(), FakeLed::default(), buttons)
    }

    #[test]
    fn green_lights_both() {
        let mut demo = demo();
        demo.press(Button::Green).unwrap();
        assert_eq!(
            demo.red.history,
            vec![LightOutput::Off, LightOutput::On]
        );
        assert_eq!(demo.blue.current(), LightOutput::On);
    }

    #[test]
    fn red_and_blue_fade_exclusively() {
        let mut demo = demo();
        demo.press(Button::Red).unwrap();
        assert_eq!(demo.red.current(), LightOutput::Pulse);
        assert_eq!(demo.blue.current(), LightOutput::Off);

        demo.press(Button::Blue).unwrap();
        assert_eq!(demo.red.current(), LightOutput::Off);
        assert_eq!(demo.blue.current(), LightOutput::Pulse);
    }

    #[test]
    fn poll_reports_held_buttons() {
        let demo = demo();
        assert!(demo.poll().is_empty());

        demo.buttons[0].1 .0.set(true);
        demo.buttons[2].1 .0.set(true);
        assert_eq!(demo.poll(), vec![Button::Green, Button::Blue]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_switches_leds_off() {
        let mut demo = demo();
        let (press_tx, press_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        press_tx.send(Button::Red).unwrap();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            stop_tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(
            run(&mut demo, press_rx, stop_rx, Duration::from_secs(1)),
            driver
        );
        result.unwrap();

        assert!(demo.red.history.contains(&LightOutput::Pulse));
        assert_eq!(demo.red.current(), LightOutput::Off);
        assert_eq!(demo.blue.current(), LightOutput::Off);
    }
}
