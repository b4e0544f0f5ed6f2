use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::Button;

pub const CONFIG_PATH_ENV: &str = "THERMOSTAT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./thermostat.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    pub initial_setpoint_f: i32,
    pub tick_interval_ms: u64,
    pub display_cycle_ticks: u32,
    pub temperature_ticks: u32,
    pub report_interval_ticks: u32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            initial_setpoint_f: 72,
            tick_interval_ms: 1_000,
            display_cycle_ticks: 10,
            temperature_ticks: 5,
            report_interval_ticks: 30,
        }
    }
}

impl ThermostatConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sanitize(&mut self) {
        self.tick_interval_ms = self.tick_interval_ms.clamp(100, 60_000);
        self.display_cycle_ticks = self.display_cycle_ticks.max(2);
        self.temperature_ticks = self
            .temperature_ticks
            .clamp(1, self.display_cycle_ticks - 1);
        self.report_interval_ticks = self.report_interval_ticks.max(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcdPins {
    pub rs: u8,
    pub enable: u8,
    pub d4: u8,
    pub d5: u8,
    pub d6: u8,
    pub d7: u8,
    pub columns: usize,
    pub rows: usize,
}

impl Default for LcdPins {
    fn default() -> Self {
        Self {
            rs: 17,
            enable: 27,
            d4: 5,
            d5: 6,
            d6: 13,
            d7: 26,
            columns: 16,
            rows: 2,
        }
    }
}

/// BCM pin numbers for the breadboard wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub red_led: u8,
    pub blue_led: u8,
    pub green_button: u8,
    pub red_button: u8,
    pub blue_button: u8,
    pub lcd: LcdPins,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            red_led: 18,
            blue_led: 23,
            green_button: 24,
            red_button: 25,
            blue_button: 12,
            lcd: LcdPins::default(),
        }
    }
}

impl PinConfig {
    pub fn button(&self, button: Button) -> u8 {
        match button {
            Button::Green => self.green_button,
            Button::Red => self.red_button,
            Button::Blue => self.blue_button,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub i2c_address: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { i2c_address: 0x38 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub controller_port: String,
    pub simulator_port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            controller_port: "/dev/ttyS0".to_string(),
            simulator_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1_000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub thermostat: ThermostatConfig,
    pub pins: PinConfig,
    pub sensor: SensorConfig,
    pub serial: SerialConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RuntimeConfig {
    /// Path named by `THERMOSTAT_CONFIG`, or `./thermostat.json`.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads and sanitizes a config file. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read(path) {
            Ok(raw) => Self::from_json(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.sanitize();
        Ok(config)
    }

    /// Like `load`, but a bad file is logged and replaced by defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            match std::error::Error::source(&err) {
                Some(cause) => warn!("{err}: {cause}, using defaults"),
                None => warn!("{err}, using defaults"),
            }
            Self::default()
        })
    }

    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn sanitize(&mut self) {
        self.thermostat.sanitize();
        if self.pins.lcd.columns == 0 {
            self.pins.lcd.columns = LcdPins::default().columns;
        }
        self.pins.lcd.rows = self.pins.lcd.rows.clamp(1, 2);
        if self.serial.baud_rate == 0 {
            self.serial.baud_rate = SerialConfig::default().baud_rate;
        }
    }
}
