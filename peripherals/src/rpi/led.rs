use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use rppal::gpio::{Gpio, OutputPin};
use tracing::{error, trace};

use thermostat_common::{
    hal::{DeviceError, DeviceResult},
    Indicator, LightOutput,
};

use crate::fade::FadeProfile;

const PWM_FREQUENCY_HZ: f64 = 100.0;

struct Fader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// An LED on a GPIO pin, dimmed with software PWM while pulsing.
pub struct PwmLed {
    pin_number: u8,
    pin: Arc<Mutex<OutputPin>>,
    profile: FadeProfile,
    output: LightOutput,
    fader: Option<Fader>,
}

impl PwmLed {
    pub fn new(gpio: &Gpio, pin: u8) -> DeviceResult<PwmLed> {
        let output = gpio
            .get(pin)
            .map_err(|e| DeviceError::Pin(pin, e.into()))?
            .into_output_low();
        Ok(PwmLed {
            pin_number: pin,
            pin: Arc::new(Mutex::new(output)),
            profile: FadeProfile::default(),
            output: LightOutput::Off,
            fader: None,
        })
    }

    fn stop_fader(&mut self) {
        if let Some(fader) = self.fader.take() {
            fader.stop.store(true, Ordering::Relaxed);
            if fader.handle.join().is_err() {
                error!("led {} fade thread panicked", self.pin_number);
            }
        }
    }

    fn with_pin<T>(
        &self,
        f: impl FnOnce(&mut OutputPin) -> rppal::gpio::Result<T>,
    ) -> DeviceResult<T> {
        let mut pin = self.pin.lock().map_err(|_| {
            DeviceError::Output(self.pin_number, "led pin mutex poisoned".into())
        })?;
        f(&mut pin).map_err(|e| DeviceError::Output(self.pin_number, e.into()))
    }

    fn set_solid(&mut self, output: LightOutput, high: bool) -> DeviceResult<()> {
        self.stop_fader();
        self.with_pin(|pin| {
            pin.clear_pwm()?;
            if high {
                pin.set_high();
            } else {
                pin.set_low();
            }
            Ok(())
        })?;
        self.output = output;
        Ok(())
    }
}

impl Indicator for PwmLed {
    fn on(&mut self) -> DeviceResult<()> {
        trace!("led {} on", self.pin_number);
        self.set_solid(LightOutput::On, true)
    }

    fn off(&mut self) -> DeviceResult<()> {
        trace!("led {} off", self.pin_number);
        self.set_solid(LightOutput::Off, false)
    }

    fn pulse(&mut self) -> DeviceResult<()> {
        if self.output == LightOutput::Pulse && self.fader.is_some() {
            return Ok(());
        }
        trace!("led {} pulse", self.pin_number);
        self.stop_fader();

        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = stop.clone();
            let pin = self.pin.clone();
            let profile = self.profile;
            let pin_number = self.pin_number;
            thread::Builder::new()
                .name(format!("led-{pin_number}-fade"))
                .spawn(move || {
                    let start = Instant::now();
                    while !stop.load(Ordering::Relaxed) {
                        let duty = profile.duty_at(start.elapsed());
                        match pin.lock() {
                            Ok(mut pin) => {
                                if let Err(e) = pin.set_pwm_frequency(PWM_FREQUENCY_HZ, duty) {
                                    error!("could not set pwm on led {pin_number}: {e}");
                                    break;
                                }
                            }
                            Err(_) => {
                                error!("led {pin_number} pin mutex poisoned");
                                break;
                            }
                        }
                        thread::sleep(profile.step);
                    }
                })
                .map_err(DeviceError::Io)?
        };

        self.fader = Some(Fader { stop, handle });
        self.output = LightOutput::Pulse;
        Ok(())
    }
}

impl Drop for PwmLed {
    fn drop(&mut self) {
        self.stop_fader();
    }
}
