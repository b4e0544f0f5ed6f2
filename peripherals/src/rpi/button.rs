use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use tracing::{debug, error};

use thermostat_common::{
    hal::{DeviceError, DeviceResult},
    Button, PushButton,
};

/// A push button wired between a GPIO pin and ground, using the internal
/// pull-up. Pressed reads low.
pub struct GpioButton {
    button: Button,
    pin: InputPin,
}

impl GpioButton {
    pub fn new(gpio: &Gpio, pin: u8, button: Button) -> DeviceResult<GpioButton> {
        let input = gpio
            .get(pin)
            .map_err(|e| DeviceError::Pin(pin, e.into()))?
            .into_input_pullup();
        Ok(GpioButton { button, pin: input })
    }

    /// Calls `on_press` from the interrupt thread on every falling edge. The
    /// callback stays registered until the button is dropped.
    pub fn on_press<F>(&mut self, mut on_press: F) -> DeviceResult<()>
    where
        F: FnMut(Button) + Send + 'static,
    {
        let button = self.button;
        let pin = self.pin.pin();
        self.pin
            .set_async_interrupt(Trigger::FallingEdge, move |level: Level| {
                debug!(button = button.as_str(), ?level, "button edge");
                on_press(button);
            })
            .map_err(|e| DeviceError::Pin(pin, e.into()))
    }
}

impl PushButton for GpioButton {
    fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }
}

impl Drop for GpioButton {
    fn drop(&mut self) {
        if let Err(e) = self.pin.clear_async_interrupt() {
            error!("could not clear interrupt for {} button: {e}", self.button.as_str());
        }
    }
}
