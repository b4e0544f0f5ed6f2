use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::types::ThermostatState;

/// One status line sent over the serial link: `state,tempF,setpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub state: ThermostatState,
    pub temp_f: i32,
    pub setpoint_f: i32,
}

impl StatusReport {
    /// Encoded line including the trailing newline.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.state, self.temp_f, self.setpoint_f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseReportError {
    #[error("expected 3 comma separated fields, found {0}")]
    FieldCount(usize),
    #[error("unknown thermostat state {0:?}")]
    State(String),
    #[error("invalid {field} value {value:?}")]
    Number { field: &'static str, value: String },
}

impl FromStr for StatusReport {
    type Err = ParseReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim_end_matches(['\r', '\n']).split(',').collect();
        let &[state, temp, setpoint] = fields.as_slice() else {
            return Err(ParseReportError::FieldCount(fields.len()));
        };

        let state = ThermostatState::parse(state)
            .ok_or_else(|| ParseReportError::State(state.to_string()))?;
        let number = |field: &'static str, value: &str| {
            value
                .trim()
                .parse::<i32>()
                .map_err(|_| ParseReportError::Number {
                    field,
                    value: value.to_string(),
                })
        };

        Ok(Self {
            state,
            temp_f: number("temperature", temp)?,
            setpoint_f: number("setpoint", setpoint)?,
        })
    }
}

#[derive(Debug, Error)]
#[error("serial line is not valid utf-8")]
pub struct LineDecodeError(#[from] std::str::Utf8Error);

/// Turns a raw serial read into the text the simulator prints.
///
/// Reads of one character or less (timeouts, bare newlines) are not worth
/// showing and yield `None`. Otherwise the line is lowercased and its terminator is
/// stripped.
pub fn normalize_line(raw: &[u8]) -> Result<Option<String>, LineDecodeError> {
    let text = std::str::from_utf8(raw)?;
    if text.chars().count() <= 1 {
        return Ok(None);
    }

    let line = text.trim_end_matches(['\r', '\n']).to_lowercase();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(line))
}
