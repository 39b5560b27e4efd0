use serde_json::Value;

use super::decode;
use super::entity::Entity;
use super::error::Result;
use super::values::Timestamp;

/// Entities of the `input_button` domain.
///
/// The state of a button is the time of its last press.
pub trait InputButton: Entity {
    /// `None` if no press is known.
    fn last_pressed_at(&self) -> Result<Option<Timestamp>> {
        match self.state_value()? {
            Value::String(s) if s == "unknown" => Ok(None),
            state => decode::timestamp(&state).map(Some),
        }
    }
}

/// Thermostats that report both a target and a measured temperature.
pub trait Climate: Entity {
    /// Target temperature
    fn temperature(&self) -> Result<f64> {
        decode::float(&self.attribute_value("temperature")?)
    }

    /// Temperature measured by the thermostat's sensor
    fn current_temperature(&self) -> Result<f64> {
        decode::float(&self.attribute_value("current_temperature")?)
    }
}
