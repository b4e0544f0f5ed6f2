use chrono::{Datelike, Timelike};

use crate::{
    config::ThermostatConfig,
    types::{whole_degrees, ThermostatState},
};

/// Two lines of text for the character display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub line1: String,
    pub line2: String,
}

impl DisplayFrame {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    /// Lines clipped to the display width.
    pub fn fitted(&self, columns: usize) -> [String; 2] {
        [
            self.line1.chars().take(columns).collect(),
            self.line2.chars().take(columns).collect(),
        ]
    }
}

impl std::fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.line1, self.line2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondLine {
    Temperature,
    StateAndSetpoint,
}

/// What a single reporting tick has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub second_line: SecondLine,
    pub refresh_lights: bool,
    pub send_report: bool,
}

/// The two independent counters driving the once-per-second loop: the
/// display alternation counter and the serial report counter. Both start at 1.
#[derive(Debug, Clone)]
pub struct TickCadence {
    display_cycle: u32,
    temperature_ticks: u32,
    report_interval: u32,
    alternation: u32,
    report_counter: u32,
}

impl TickCadence {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self {
            display_cycle: config.display_cycle_ticks,
            temperature_ticks: config.temperature_ticks,
            report_interval: config.report_interval_ticks,
            alternation: 1,
            report_counter: 1,
        }
    }

    pub fn advance(&mut self) -> TickPlan {
        let mut refresh_lights = false;
        let second_line = if self.alternation <= self.temperature_ticks {
            self.alternation += 1;
            SecondLine::Temperature
        } else {
            self.alternation += 1;
            if self.alternation > self.display_cycle {
                refresh_lights = true;
                self.alternation = 1;
            }
            SecondLine::StateAndSetpoint
        };

        let send_report = self.report_counter % self.report_interval == 0;
        if send_report {
            self.report_counter = 1;
        } else {
            self.report_counter += 1;
        }

        TickPlan {
            second_line,
            refresh_lights,
            send_report,
        }
    }

    pub fn report_counter(&self) -> u32 {
        self.report_counter
    }
}

pub fn timestamp_line<T: Datelike + Timelike>(now: &T) -> String {
    format!(
        "{:02}/{:02} {:02}:{:02}:{:02}",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

pub fn temperature_line(temp_f: f32) -> String {
    format!("Temp: {}F", whole_degrees(temp_f))
}

pub fn state_line(state: ThermostatState, setpoint_f: i32) -> String {
    format!("{} {}F", state.label(), setpoint_f)
}
