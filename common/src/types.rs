use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatState {
    #[default]
    Off,
    Heat,
    Cool,
}

impl ThermostatState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }

    /// Capitalized name shown on the display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Heat => "Heat",
            Self::Cool => "Cool",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Heat,
            Self::Heat => Self::Cool,
            Self::Cool => Self::Off,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "heat" => Some(Self::Heat),
            "cool" => Some(Self::Cool),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThermostatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightOutput {
    Off,
    On,
    Pulse,
}

impl LightOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Pulse => "pulse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightCommand {
    pub red: LightOutput,
    pub blue: LightOutput,
}

impl LightCommand {
    pub const DARK: Self = Self {
        red: LightOutput::Off,
        blue: LightOutput::Off,
    };
}

/// The three physical push buttons, named by cap color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Green,
    Red,
    Blue,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Green, Button::Red, Button::Blue];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }
}

/// What a button press means to the thermostat controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cycle,
    RaiseSetpoint,
    LowerSetpoint,
}

impl From<Button> for Command {
    fn from(button: Button) -> Self {
        match button {
            Button::Green => Self::Cycle,
            Button::Red => Self::RaiseSetpoint,
            Button::Blue => Self::LowerSetpoint,
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    (9.0 / 5.0) * celsius + 32.0
}

/// Whole degrees used for every comparison and display, truncated toward
/// negative infinity.
pub fn whole_degrees(temp_f: f32) -> i32 {
    temp_f.floor() as i32
}
