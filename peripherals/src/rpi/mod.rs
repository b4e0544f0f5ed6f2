//! Raspberry Pi drivers built on rppal.

mod button;
mod lcd;
mod led;
mod sensor;
mod uart;

pub use button::GpioButton;
pub use lcd::Hd44780;
pub use led::PwmLed;
pub use rppal::gpio::Gpio;
pub use sensor::Aht20;
pub use uart::SerialPort;

use thermostat_common::hal::{DeviceError, DeviceResult};

/// Opens the GPIO peripheral.
pub fn gpio() -> DeviceResult<Gpio> {
    Gpio::new().map_err(|e| DeviceError::Initialization("gpio", e.into()))
}
