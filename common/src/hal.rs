//! Narrow interfaces to the breadboard hardware.
//!
//! Every program owns its devices through these traits so the thermostat loop
//! can run against the Raspberry Pi drivers, the desktop simulations, or test
//! fakes.

use thiserror::Error;

use crate::{display::DisplayFrame, types::LightOutput};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not initialize {0}")]
    Initialization(&'static str, #[source] BoxError),
    #[error("could not claim gpio pin {0}")]
    Pin(u8, #[source] BoxError),
    #[error("could not drive gpio pin {0}")]
    Output(u8, #[source] BoxError),
    #[error("i2c transfer with device {address:#04x} failed")]
    I2c {
        address: u16,
        #[source]
        source: BoxError,
    },
    #[error("sensor {0:#04x} stayed busy")]
    SensorBusy(u16),
    #[error("serial port {port} failed")]
    Serial {
        port: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

pub trait TemperatureSensor {
    fn read_celsius(&mut self) -> DeviceResult<f32>;
}

/// A single LED that can be solid, dark, or fading in and out.
pub trait Indicator {
    fn on(&mut self) -> DeviceResult<()>;
    fn off(&mut self) -> DeviceResult<()>;
    fn pulse(&mut self) -> DeviceResult<()>;

    fn apply(&mut self, output: LightOutput) -> DeviceResult<()> {
        match output {
            LightOutput::Off => self.off(),
            LightOutput::On => self.on(),
            LightOutput::Pulse => self.pulse(),
        }
    }
}

/// A character display with clear-and-redraw semantics.
pub trait TextDisplay {
    fn clear(&mut self) -> DeviceResult<()>;
    fn write(&mut self, frame: &DisplayFrame) -> DeviceResult<()>;
    /// Clears the screen and gives the pins back.
    fn release(&mut self) -> DeviceResult<()>;
}

pub trait StatusSink {
    fn send_line(&mut self, line: &str) -> DeviceResult<()>;
}

pub trait LineSource {
    /// Blocks for at most the port timeout. A timeout yields whatever arrived,
    /// possibly nothing.
    fn read_line(&mut self) -> DeviceResult<Vec<u8>>;
}

pub trait PushButton {
    fn is_pressed(&self) -> bool;
}
