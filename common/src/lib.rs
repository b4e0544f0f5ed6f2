pub mod config;
pub mod demo;
pub mod display;
pub mod hal;
pub mod report;
pub mod shutdown;
pub mod thermostat;
pub mod types;

pub use config::{PinConfig, RuntimeConfig, SerialConfig, ThermostatConfig};
pub use display::{DisplayFrame, SecondLine, TickCadence, TickPlan};
pub use hal::{
    DeviceError, DeviceResult, Indicator, LineSource, PushButton, StatusSink, TemperatureSensor,
    TextDisplay,
};
pub use report::StatusReport;
pub use thermostat::{EngineAction, ThermostatEngine};
pub use types::{Button, Command, LightCommand, LightOutput, ThermostatState};
