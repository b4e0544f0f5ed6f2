use crate::{
    thermostat::EngineAction,
    types::{Button, LightOutput},
};

/// Light pattern for the multi-button LED demo.
///
/// Green lights both LEDs solid, red fades the red LED, blue fades the blue
/// LED. Each pattern first switches off whatever the other LED was doing.
pub fn demo_actions(button: Button) -> Vec<EngineAction> {
    match button {
        Button::Green => vec![
            EngineAction::Red(LightOutput::Off),
            EngineAction::Blue(LightOutput::Off),
            EngineAction::Red(LightOutput::On),
            EngineAction::Blue(LightOutput::On),
        ],
        Button::Red => vec![
            EngineAction::Blue(LightOutput::Off),
            EngineAction::Red(LightOutput::Pulse),
        ],
        Button::Blue => vec![
            EngineAction::Red(LightOutput::Off),
            EngineAction::Blue(LightOutput::Pulse),
        ],
    }
}

pub fn demo_description(button: Button) -> &'static str {
    match button {
        Button::Green => "both LEDs on",
        Button::Red => "fading red",
        Button::Blue => "fading blue",
    }
}
