use std::time::Duration;

use rppal::uart::{Parity, Uart};
use tracing::{info, trace};

use thermostat_common::{
    hal::{DeviceError, DeviceResult},
    LineSource, StatusSink,
};

const DATA_BITS: u8 = 8;
const STOP_BITS: u8 = 1;
const MAX_LINE: usize = 256;

/// A UART at `baud` 8N1. Reads block for at most `timeout` per byte.
pub struct SerialPort {
    uart: Uart,
    port: String,
}

impl SerialPort {
    pub fn open(port: &str, baud: u32, timeout: Duration) -> DeviceResult<SerialPort> {
        let serial_error = |e: rppal::uart::Error| DeviceError::Serial {
            port: port.to_string(),
            source: e.into(),
        };
        let mut uart = Uart::with_path(port, baud, Parity::None, DATA_BITS, STOP_BITS)
            .map_err(serial_error)?;
        uart.set_read_mode(0, timeout).map_err(serial_error)?;
        uart.set_write_mode(true).map_err(serial_error)?;
        info!("opened serial port {port} at {baud} baud");
        Ok(SerialPort {
            uart,
            port: port.to_string(),
        })
    }

    fn error(&self, e: rppal::uart::Error) -> DeviceError {
        DeviceError::Serial {
            port: self.port.clone(),
            source: e.into(),
        }
    }
}

impl StatusSink for SerialPort {
    fn send_line(&mut self, line: &str) -> DeviceResult<()> {
        trace!("writing {line:?} to {}", self.port);
        let mut remaining = line.as_bytes();
        while !remaining.is_empty() {
            let written = self.uart.write(remaining).map_err(|e| self.error(e))?;
            remaining = &remaining[written..];
        }
        self.uart.drain().map_err(|e| self.error(e))?;
        Ok(())
    }
}

impl LineSource for SerialPort {
    fn read_line(&mut self) -> DeviceResult<Vec<u8>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        while line.len() < MAX_LINE {
            let read = self.uart.read(&mut byte).map_err(|e| self.error(e))?;
            if read == 0 {
                break;
            }
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }
        Ok(line)
    }
}
