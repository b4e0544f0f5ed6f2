use tracing::{debug, info};

use crate::{
    config::ThermostatConfig,
    report::StatusReport,
    types::{whole_degrees, Command, LightCommand, LightOutput, ThermostatState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    Red(LightOutput),
    Blue(LightOutput),
    /// Read the sensor and apply `render_lights` to both outputs.
    RefreshLights,
}

#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    state: ThermostatState,
    setpoint_f: i32,
}

impl ThermostatEngine {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self::with_setpoint(config.initial_setpoint_f)
    }

    pub fn with_setpoint(setpoint_f: i32) -> Self {
        Self {
            state: ThermostatState::Off,
            setpoint_f,
        }
    }

    pub fn state(&self) -> ThermostatState {
        self.state
    }

    pub fn setpoint_f(&self) -> i32 {
        self.setpoint_f
    }

    pub fn handle(&mut self, command: Command) -> Vec<EngineAction> {
        match command {
            Command::Cycle => self.cycle(),
            Command::RaiseSetpoint => self.increment_setpoint(),
            Command::LowerSetpoint => self.decrement_setpoint(),
        }
    }

    pub fn cycle(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        let previous = self.state;
        let next = previous.next();

        match previous {
            ThermostatState::Heat => actions.push(EngineAction::Red(LightOutput::Off)),
            ThermostatState::Cool => actions.push(EngineAction::Blue(LightOutput::Off)),
            ThermostatState::Off => {}
        }

        self.state = next;
        info!(from = %previous, to = %next, "changing state");

        match next {
            ThermostatState::Off => {
                actions.push(EngineAction::Red(LightOutput::Off));
                actions.push(EngineAction::Blue(LightOutput::Off));
            }
            ThermostatState::Heat | ThermostatState::Cool => {
                actions.push(EngineAction::RefreshLights);
            }
        }

        actions
    }

    pub fn increment_setpoint(&mut self) -> Vec<EngineAction> {
        self.setpoint_f = self.setpoint_f.wrapping_add(1);
        debug!(setpoint = self.setpoint_f, "increasing set point");
        vec![EngineAction::RefreshLights]
    }

    pub fn decrement_setpoint(&mut self) -> Vec<EngineAction> {
        self.setpoint_f = self.setpoint_f.wrapping_sub(1);
        debug!(setpoint = self.setpoint_f, "decreasing set point");
        vec![EngineAction::RefreshLights]
    }

    pub fn render_lights(&self, temp_f: f32) -> LightCommand {
        let temp = whole_degrees(temp_f);
        let command = match self.state {
            ThermostatState::Off => LightCommand::DARK,
            ThermostatState::Heat => LightCommand {
                red: if temp < self.setpoint_f {
                    LightOutput::Pulse
                } else {
                    LightOutput::On
                },
                blue: LightOutput::Off,
            },
            ThermostatState::Cool => LightCommand {
                red: LightOutput::Off,
                blue: if temp > self.setpoint_f {
                    LightOutput::Pulse
                } else {
                    LightOutput::On
                },
            },
        };
        debug!(
            state = %self.state,
            setpoint = self.setpoint_f,
            temp,
            red = command.red.as_str(),
            blue = command.blue.as_str(),
            "rendered lights"
        );
        command
    }

    pub fn status_report(&self, temp_f: f32) -> StatusReport {
        StatusReport {
            state: self.state,
            temp_f: whole_degrees(temp_f),
            setpoint_f: self.setpoint_f,
        }
    }
}
