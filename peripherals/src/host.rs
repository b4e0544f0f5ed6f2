//! Desktop stand-ins for the breadboard hardware. LEDs and the LCD become
//! tracing events, the serial port is a pair of byte streams, and buttons are
//! typed on stdin.

use std::{
    io::{BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, info, warn};

use thermostat_common::{
    hal::DeviceResult, Button, DisplayFrame, Indicator, LightOutput, LineSource, PushButton,
    StatusSink, TemperatureSensor, TextDisplay,
};

/// Slowly drifting room temperature around 20C.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    reads: u64,
}

impl TemperatureSensor for SimulatedSensor {
    fn read_celsius(&mut self) -> DeviceResult<f32> {
        self.reads = self.reads.saturating_add(1);
        // One step every 30 reads, over an 8 step sawtooth.
        let step = (self.reads / 30) % 8;
        Ok(19.0 + step as f32 * 0.4)
    }
}

#[derive(Debug)]
pub struct ConsoleLed {
    name: &'static str,
    output: LightOutput,
}

impl ConsoleLed {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            output: LightOutput::Off,
        }
    }

    pub fn output(&self) -> LightOutput {
        self.output
    }

    fn set(&mut self, output: LightOutput) -> DeviceResult<()> {
        if self.output != output {
            info!(led = self.name, output = output.as_str(), "led changed");
            self.output = output;
        }
        Ok(())
    }
}

impl Indicator for ConsoleLed {
    fn on(&mut self) -> DeviceResult<()> {
        self.set(LightOutput::On)
    }

    fn off(&mut self) -> DeviceResult<()> {
        self.set(LightOutput::Off)
    }

    fn pulse(&mut self) -> DeviceResult<()> {
        self.set(LightOutput::Pulse)
    }
}

#[derive(Debug)]
pub struct ConsoleDisplay {
    columns: usize,
}

impl ConsoleDisplay {
    pub fn new(columns: usize) -> Self {
        Self { columns }
    }
}

impl TextDisplay for ConsoleDisplay {
    fn clear(&mut self) -> DeviceResult<()> {
        debug!("lcd cleared");
        Ok(())
    }

    fn write(&mut self, frame: &DisplayFrame) -> DeviceResult<()> {
        let [line1, line2] = frame.fitted(self.columns);
        let width = self.columns;
        info!("lcd |{line1:<width$}|{line2:<width$}|");
        Ok(())
    }

    fn release(&mut self) -> DeviceResult<()> {
        debug!("lcd released");
        Ok(())
    }
}

/// Serial transmit side backed by any writer, stdout by default.
pub struct StreamSerial<W> {
    writer: W,
}

impl StreamSerial<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: std::io::stdout(),
        }
    }
}

impl<W: Write> StreamSerial<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatusSink for StreamSerial<W> {
    fn send_line(&mut self, line: &str) -> DeviceResult<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Serial receive side backed by any buffered reader, stdin by default.
/// End of input behaves like a port that only ever times out.
pub struct StreamLineSource<R> {
    reader: R,
    exhausted: bool,
}

impl StreamLineSource<std::io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock())
    }
}

impl<R: BufRead> StreamLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<R: BufRead> LineSource for StreamLineSource<R> {
    fn read_line(&mut self) -> DeviceResult<Vec<u8>> {
        if self.exhausted {
            std::thread::sleep(std::time::Duration::from_secs(1));
            return Ok(Vec::new());
        }

        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            debug!("serial input closed");
            self.exhausted = true;
        }
        Ok(line)
    }
}

/// A button whose presses arrive from the keyboard. `is_pressed` reports a
/// press once, then resets.
#[derive(Debug, Clone, Default)]
pub struct LatchedButton {
    pressed: Arc<AtomicBool>,
}

impl LatchedButton {
    pub fn press(&self) {
        self.pressed.store(true, Ordering::Relaxed);
    }
}

impl PushButton for LatchedButton {
    fn is_pressed(&self) -> bool {
        self.pressed.swap(false, Ordering::Relaxed)
    }
}

/// Maps a typed line onto a button. Accepts the cap colors and the controller
/// shorthands `c`, `+` and `-`.
pub fn parse_button(input: &str) -> Option<Button> {
    match input.trim().to_ascii_lowercase().as_str() {
        "g" | "green" | "c" | "cycle" => Some(Button::Green),
        "r" | "red" | "+" | "up" => Some(Button::Red),
        "b" | "blue" | "-" | "down" => Some(Button::Blue),
        _ => None,
    }
}

/// Reads button presses from stdin on a background thread and hands each one
/// to `on_press`. The thread ends with stdin or when `on_press` returns false.
pub fn spawn_keyboard_buttons<F>(mut on_press: F) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: FnMut(Button) -> bool + Send + 'static,
{
    std::thread::Builder::new()
        .name("keyboard-buttons".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("stdin read failed: {err}");
                        break;
                    }
                };
                match parse_button(&line) {
                    Some(button) => {
                        debug!(button = button.as_str(), "button pressed");
                        if !on_press(button) {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown button {line:?}, use g/r/b"),
                }
            }
            debug!("keyboard button reader stopped");
        })
}
