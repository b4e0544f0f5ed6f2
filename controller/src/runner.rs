//! The controller's event loop: button presses, display ticks and the stop
//! flag are handled one at a time by a single task that owns every device.

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Local, Timelike};
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tracing::{debug, info, trace, warn};

use thermostat_common::{
    display::{state_line, temperature_line, timestamp_line},
    types::celsius_to_fahrenheit,
    Button, Command, DisplayFrame, EngineAction, Indicator, LightOutput, SecondLine, StatusSink,
    TemperatureSensor, TextDisplay, ThermostatConfig, ThermostatEngine, TickCadence, TickPlan,
};

/// Everything the controller drives.
pub struct Devices<S, D, O, L> {
    pub sensor: S,
    pub display: D,
    pub serial: O,
    pub red: L,
    pub blue: L,
}

pub struct Controller<S, D, O, L> {
    engine: ThermostatEngine,
    cadence: TickCadence,
    devices: Devices<S, D, O, L>,
}

impl<S, D, O, L> Controller<S, D, O, L>
where
    S: TemperatureSensor,
    D: TextDisplay,
    O: StatusSink,
    L: Indicator,
{
    pub fn new(config: &ThermostatConfig, devices: Devices<S, D, O, L>) -> Self {
        Self {
            engine: ThermostatEngine::new(config),
            cadence: TickCadence::new(config),
            devices,
        }
    }

    pub fn engine(&self) -> &ThermostatEngine {
        &self.engine
    }

    /// Puts the outputs in the state matching a fresh `Off` engine.
    pub fn start(&mut self) -> anyhow::Result<()> {
        self.devices.display.clear().context("failed to clear the display")?;
        self.execute(vec![
            EngineAction::Red(LightOutput::Off),
            EngineAction::Blue(LightOutput::Off),
        ])
    }

    pub fn handle(&mut self, button: Button) -> anyhow::Result<()> {
        let command = Command::from(button);
        debug!(button = button.as_str(), ?command, "button pressed");
        let actions = self.engine.handle(command);
        self.execute(actions)
    }

    /// One pass of the display loop.
    pub fn tick<T: Datelike + Timelike>(&mut self, now: &T) -> anyhow::Result<TickPlan> {
        let plan = self.cadence.advance();
        trace!(?plan, report_counter = self.cadence.report_counter(), "tick");

        let line1 = timestamp_line(now);
        let line2 = match plan.second_line {
            SecondLine::Temperature => temperature_line(self.read_fahrenheit()?),
            SecondLine::StateAndSetpoint => {
                state_line(self.engine.state(), self.engine.setpoint_f())
            }
        };
        if plan.refresh_lights {
            self.execute(vec![EngineAction::RefreshLights])?;
        }

        self.devices
            .display
            .write(&DisplayFrame::new(line1, line2))
            .context("failed to update the display")?;

        if plan.send_report {
            let fahrenheit = self.read_fahrenheit()?;
            let report = self.engine.status_report(fahrenheit);
            debug!(%report, "sending status report");
            self.devices
                .serial
                .send_line(&report.to_line())
                .context("failed to write the status report")?;
        }
        Ok(plan)
    }

    /// Clears and releases the display and turns both LEDs off. Every step is
    /// attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        let devices = &mut self.devices;
        let steps = [
            devices.display.clear().context("failed to clear the display"),
            devices.display.release().context("failed to release the display"),
            devices.red.off().context("failed to turn off the red led"),
            devices.blue.off().context("failed to turn off the blue led"),
        ];

        let mut first = None;
        for err in steps.into_iter().filter_map(Result::err) {
            if first.is_none() {
                first = Some(err);
            } else {
                warn!("{err:#}");
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn execute(&mut self, actions: Vec<EngineAction>) -> anyhow::Result<()> {
        for action in actions {
            match action {
                EngineAction::Red(output) => self
                    .devices
                    .red
                    .apply(output)
                    .context("failed to drive the red led")?,
                EngineAction::Blue(output) => self
                    .devices
                    .blue
                    .apply(output)
                    .context("failed to drive the blue led")?,
                EngineAction::RefreshLights => {
                    let fahrenheit = self.read_fahrenheit()?;
                    let lights = self.engine.render_lights(fahrenheit);
                    self.devices
                        .red
                        .apply(lights.red)
                        .context("failed to drive the red led")?;
                    self.devices
                        .blue
                        .apply(lights.blue)
                        .context("failed to drive the blue led")?;
                }
            }
        }
        Ok(())
    }

    fn read_fahrenheit(&mut self) -> anyhow::Result<f32> {
        let celsius = self
            .devices
            .sensor
            .read_celsius()
            .context("failed to read the temperature sensor")?;
        Ok(celsius_to_fahrenheit(celsius))
    }
}

/// Runs until `stop` turns true, then cleans up. A device failure ends the
/// loop early; cleanup is still attempted and the failure is returned.
pub async fn run<S, D, O, L>(
    controller: &mut Controller<S, D, O, L>,
    mut buttons: mpsc::UnboundedReceiver<Button>,
    mut stop: watch::Receiver<bool>,
    period: Duration,
) -> anyhow::Result<()>
where
    S: TemperatureSensor,
    D: TextDisplay,
    O: StatusSink,
    L: Indicator,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = async {
        controller.start()?;
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                Some(button) = buttons.recv() => controller.handle(button)?,
                _ = ticker.tick() => {
                    controller.tick(&Local::now())?;
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        debug!("stop sender dropped");
                        break;
                    }
                }
            }
        }
        anyhow::Ok(())
    }
    .await;

    info!("controller loop stopped");
    match (outcome, controller.shutdown()) {
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
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use thermostat_common::{hal::DeviceResult, DeviceError, ThermostatState};

    struct FakeSensor {
        celsius: f32,
        reads: usize,
        fail: bool,
    }

    impl FakeSensor {
        fn at_fahrenheit(temp_f: f32) -> Self {
            Self {
                celsius: (temp_f - 32.0) * 5.0 / 9.0,
                reads: 0,
                fail: false,
            }
        }
    }

    impl TemperatureSensor for FakeSensor {
        fn read_celsius(&mut self) -> DeviceResult<f32> {
            if self.fail {
                return Err(DeviceError::SensorBusy(0x38));
            }
            self.reads += 1;
            Ok(self.celsius)
        }
    }

    #[derive(Default)]
    struct FakeDisplay {
        frames: Vec<DisplayFrame>,
        clears: usize,
        released: bool,
        fail_clear: bool,
    }

    impl TextDisplay for FakeDisplay {
        fn clear(&mut self) -> DeviceResult<()> {
            if self.fail_clear {
                return Err(std::io::Error::other("lcd unplugged").into());
            }
            self.clears += 1;
            Ok(())
        }

        fn write(&mut self, frame: &DisplayFrame) -> DeviceResult<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn release(&mut self) -> DeviceResult<()> {
            self.released = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSerial {
        lines: Vec<String>,
    }

    impl StatusSink for FakeSerial {
        fn send_line(&mut self, line: &str) -> DeviceResult<()> {
            self.lines.push(line.to_string());
            Ok(())
        }
    }

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

    type FakeController = Controller<FakeSensor, FakeDisplay, FakeSerial, FakeLed>;

    fn controller(temp_f: f32, setpoint_f: i32) -> FakeController {
        let config = ThermostatConfig {
            initial_setpoint_f: setpoint_f,
            ..ThermostatConfig::default()
        };
        Controller::new(
            &config,
            Devices {
                sensor: FakeSensor::at_fahrenheit(temp_f),
                display: FakeDisplay::default(),
                serial: FakeSerial::default(),
                red: FakeLed::default(),
                blue: FakeLed::default(),
            },
        )
    }

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|day| day.and_hms_opt(12, 30, 5))
            .unwrap()
    }

    #[test]
    fn heat_below_setpoint_pulses_red() {
        let mut controller = controller(68.7, 70);
        controller.handle(Button::Green).unwrap();

        assert_eq!(controller.engine().state(), ThermostatState::Heat);
        assert_eq!(controller.devices.red.current(), LightOutput::Pulse);
        assert_eq!(controller.devices.blue.current(), LightOutput::Off);
    }

    #[test]
    fn cool_at_setpoint_is_satisfied() {
        let mut controller = controller(70.0, 70);
        controller.handle(Button::Green).unwrap();
        controller.handle(Button::Green).unwrap();

        assert_eq!(controller.engine().state(), ThermostatState::Cool);
        assert_eq!(controller.devices.red.current(), LightOutput::Off);
        assert_eq!(controller.devices.blue.current(), LightOutput::On);
    }

    #[test]
    fn cycling_into_off_skips_the_sensor() {
        let mut controller = controller(75.0, 70);
        controller.handle(Button::Green).unwrap();
        controller.handle(Button::Green).unwrap();
        let reads = controller.devices.sensor.reads;

        controller.handle(Button::Green).unwrap();

        assert_eq!(controller.engine().state(), ThermostatState::Off);
        assert_eq!(controller.devices.sensor.reads, reads);
        assert_eq!(controller.devices.red.current(), LightOutput::Off);
        assert_eq!(controller.devices.blue.current(), LightOutput::Off);
    }

    #[test]
    fn setpoint_buttons_refresh_lights() {
        let mut controller = controller(70.2, 70);
        controller.handle(Button::Green).unwrap();
        assert_eq!(controller.devices.red.current(), LightOutput::On);

        controller.handle(Button::Red).unwrap();
        assert_eq!(controller.engine().setpoint_f(), 71);
        assert_eq!(controller.devices.red.current(), LightOutput::Pulse);

        controller.handle(Button::Blue).unwrap();
        assert_eq!(controller.engine().setpoint_f(), 70);
        assert_eq!(controller.devices.red.current(), LightOutput::On);
    }

    #[test]
    fn ticks_alternate_second_line() {
        let mut controller = controller(68.7, 72);
        for _ in 0..10 {
            controller.tick(&noon()).unwrap();
        }

        let frames = &controller.devices.display.frames;
        assert_eq!(frames.len(), 10);
        assert!(frames.iter().all(|frame| frame.line1 == "03/07 12:30:05"));
        for frame in &frames[..5] {
            assert_eq!(frame.line2, "Temp: 68F");
        }
        for frame in &frames[5..] {
            assert_eq!(frame.line2, "Off 72F");
        }
    }

    #[test]
    fn tenth_tick_refreshes_lights() {
        let mut controller = controller(80.0, 72);
        controller.handle(Button::Green).unwrap();
        controller.devices.red.history.clear();

        for tick in 1..=10 {
            let plan = controller.tick(&noon()).unwrap();
            assert_eq!(plan.refresh_lights, tick == 10, "tick {tick}");
        }
        assert_eq!(controller.devices.red.history, vec![LightOutput::On]);
    }

    #[test]
    fn reports_every_thirty_ticks() {
        let mut controller = controller(68.7, 70);
        controller.handle(Button::Green).unwrap();

        let mut report_ticks = Vec::new();
        for tick in 1..=90 {
            if controller.tick(&noon()).unwrap().send_report {
                report_ticks.push(tick);
            }
        }

        assert_eq!(report_ticks, vec![30, 60, 90]);
        assert_eq!(controller.devices.serial.lines, vec!["heat,68,70\n"; 3]);
    }

    #[test]
    fn sensor_failure_is_reported_with_context() {
        let mut controller = controller(70.0, 70);
        controller.devices.sensor.fail = true;

        let err = controller.handle(Button::Green).unwrap_err();
        assert_eq!(err.to_string(), "failed to read the temperature sensor");
        assert_eq!(controller.engine().state(), ThermostatState::Heat);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut controller = controller(60.0, 70);
        controller.handle(Button::Green).unwrap();
        controller.shutdown().unwrap();

        assert!(controller.devices.display.released);
        assert_eq!(controller.devices.display.clears, 1);
        assert_eq!(controller.devices.red.current(), LightOutput::Off);
        assert_eq!(controller.devices.blue.current(), LightOutput::Off);
    }

    #[test]
    fn shutdown_turns_leds_off_even_if_the_display_fails() {
        let mut controller = controller(60.0, 70);
        controller.handle(Button::Green).unwrap();
        assert_eq!(controller.devices.red.current(), LightOutput::Pulse);
        controller.devices.display.fail_clear = true;

        let err = controller.shutdown().unwrap_err();

        assert_eq!(err.to_string(), "failed to clear the display");
        assert!(controller.devices.display.released);
        assert_eq!(controller.devices.red.current(), LightOutput::Off);
        assert_eq!(controller.devices.blue.current(), LightOutput::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_reports_three_times_in_ninety_seconds() {
        let mut controller = controller(68.7, 70);
        let (button_tx, button_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        button_tx.send(Button::Green).unwrap();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(89_500)).await;
            stop_tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(
            run(&mut controller, button_rx, stop_rx, Duration::from_secs(1)),
            driver
        );
        result.unwrap();

        assert_eq!(controller.devices.display.frames.len(), 90);
        assert_eq!(controller.devices.serial.lines, vec!["heat,68,70\n"; 3]);
        assert!(controller.devices.display.released);
        assert_eq!(controller.devices.red.current(), LightOutput::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_exits_when_stop_is_already_set() {
        let mut controller = controller(68.7, 70);
        let (_button_tx, button_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = watch::channel(true);

        run(&mut controller, button_rx, stop_rx, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(controller.devices.display.frames.is_empty());
        assert!(controller.devices.display.released);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_fails_fast_on_sensor_error() {
        let mut controller = controller(68.7, 70);
        controller.devices.sensor.fail = true;
        let (_button_tx, button_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);

        let err = run(&mut controller, button_rx, stop_rx, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "failed to read the temperature sensor");
        assert!(controller.devices.display.released);
    }
}
