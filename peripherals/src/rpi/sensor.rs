use std::{thread::sleep, time::Duration};

use rppal::i2c::I2c;
use tracing::{debug, trace};

use thermostat_common::{
    hal::{DeviceError, DeviceResult},
    TemperatureSensor,
};

use crate::aht20::{self, Frame};

const MEASUREMENT_DELAY: Duration = Duration::from_millis(80);
const BUSY_POLL: Duration = Duration::from_millis(10);
const BUSY_RETRIES: usize = 10;

/// AHT20 temperature sensor on the Pi's I2C bus.
pub struct Aht20 {
    i2c: I2c,
    address: u16,
}

impl Aht20 {
    pub fn new(address: u16) -> DeviceResult<Aht20> {
        let mut i2c = I2c::new().map_err(|e| DeviceError::Initialization("i2c", e.into()))?;
        i2c.set_slave_address(address)
            .map_err(|e| DeviceError::I2c {
                address,
                source: e.into(),
            })?;
        let mut sensor = Aht20 { i2c, address };
        sensor.calibrate()?;
        Ok(sensor)
    }

    fn i2c_error(&self, e: rppal::i2c::Error) -> DeviceError {
        DeviceError::I2c {
            address: self.address,
            source: e.into(),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> DeviceResult<()> {
        self.i2c.write(bytes).map_err(|e| self.i2c_error(e))?;
        Ok(())
    }

    fn read_status(&mut self) -> DeviceResult<u8> {
        let mut status = [0u8; 1];
        self.i2c.read(&mut status).map_err(|e| self.i2c_error(e))?;
        Ok(status[0])
    }

    fn calibrate(&mut self) -> DeviceResult<()> {
        self.write(&[aht20::CMD_SOFT_RESET])?;
        sleep(Duration::from_millis(20));
        if !aht20::is_calibrated(self.read_status()?) {
            debug!("aht20 not calibrated, initializing");
            self.write(&aht20::CMD_INITIALIZE)?;
            sleep(Duration::from_millis(10));
            self.wait_until_idle()?;
        }
        Ok(())
    }

    fn wait_until_idle(&mut self) -> DeviceResult<()> {
        for _ in 0..BUSY_RETRIES {
            if !aht20::is_busy(self.read_status()?) {
                return Ok(());
            }
            sleep(BUSY_POLL);
        }
        Err(DeviceError::SensorBusy(self.address))
    }

    fn read_frame(&mut self) -> DeviceResult<Frame> {
        self.write(&aht20::CMD_TRIGGER)?;
        sleep(MEASUREMENT_DELAY);
        self.wait_until_idle()?;
        let mut frame = [0u8; 6];
        self.i2c.read(&mut frame).map_err(|e| self.i2c_error(e))?;
        Ok(frame)
    }
}

impl TemperatureSensor for Aht20 {
    fn read_celsius(&mut self) -> DeviceResult<f32> {
        let frame = self.read_frame()?;
        let celsius = aht20::temperature_celsius(&frame);
        trace!("read temperature: {celsius}C from {frame:02x?}");
        Ok(celsius)
    }
}
