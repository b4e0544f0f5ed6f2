use std::{thread::sleep, time::Duration};

use rppal::gpio::{Gpio, OutputPin};
use tracing::{info, trace};

use thermostat_common::{
    config::LcdPins,
    hal::{DeviceError, DeviceResult},
    DisplayFrame, TextDisplay,
};

use crate::hd44780::{self, LcdMessage};

const ENABLE_PULSE: Duration = Duration::from_micros(1);
const COMMAND_SETTLE: Duration = Duration::from_micros(100);

/// HD44780 character LCD driven directly from six GPIO pins in 4-bit mode.
pub struct Hd44780 {
    rs: OutputPin,
    enable: OutputPin,
    data: [OutputPin; 4],
    columns: usize,
    rows: usize,
    released: bool,
}

impl Hd44780 {
    pub fn new(gpio: &Gpio, pins: &LcdPins) -> DeviceResult<Hd44780> {
        let output = |pin: u8| -> DeviceResult<OutputPin> {
            Ok(gpio
                .get(pin)
                .map_err(|e| DeviceError::Pin(pin, e.into()))?
                .into_output_low())
        };

        let mut lcd = Hd44780 {
            rs: output(pins.rs)?,
            enable: output(pins.enable)?,
            data: [
                output(pins.d4)?,
                output(pins.d5)?,
                output(pins.d6)?,
                output(pins.d7)?,
            ],
            columns: pins.columns,
            rows: pins.rows,
            released: false,
        };
        info!(
            "starting {}x{} lcd, rs {} en {}",
            lcd.columns, lcd.rows, pins.rs, pins.enable
        );
        lcd.send_all(&hd44780::init_sequence());
        Ok(lcd)
    }

    fn send_all(&mut self, messages: &[LcdMessage]) {
        for message in messages {
            self.send(*message);
        }
    }

    fn send(&mut self, message: LcdMessage) {
        match message {
            LcdMessage::Cmd(byte) => {
                trace!("writing cmd {byte:#04x} to lcd");
                self.rs.set_low();
                self.write_byte(byte);
            }
            LcdMessage::Char(byte) => {
                self.rs.set_high();
                self.write_byte(byte);
            }
            LcdMessage::Nibble(nibble) => {
                self.rs.set_low();
                self.write_nibble(nibble);
            }
            LcdMessage::Wait(duration) => sleep(duration),
        }
    }

    fn write_byte(&mut self, byte: u8) {
        for nibble in hd44780::nibbles(byte) {
            self.write_nibble(nibble);
        }
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        self.enable.set_low();
        sleep(ENABLE_PULSE);
        self.enable.set_high();
        sleep(ENABLE_PULSE);
        self.enable.set_low();
        sleep(COMMAND_SETTLE);
    }
}

impl TextDisplay for Hd44780 {
    fn clear(&mut self) -> DeviceResult<()> {
        trace!("clearing lcd");
        self.send_all(&hd44780::clear_sequence());
        Ok(())
    }

    fn write(&mut self, frame: &DisplayFrame) -> DeviceResult<()> {
        let messages = hd44780::frame_sequence(frame, self.columns, self.rows);
        self.send_all(&messages);
        Ok(())
    }

    fn release(&mut self) -> DeviceResult<()> {
        if self.released {
            return Ok(());
        }
        self.clear()?;
        self.rs.set_low();
        self.enable.set_low();
        for pin in self.data.iter_mut() {
            pin.set_low();
        }
        self.released = true;
        info!("lcd released");
        Ok(())
    }
}
