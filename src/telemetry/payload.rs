//! Wire payload.
//!
//! ```json
//! {"board":"Placa de Teste","location":"Forno 1","sensors":[
//!   {"name":"Sensor 1","status":true,"temp":"25.1234"},
//!   {"name":"Sensor 2","status":false,"temp":"0.0000"}]}
//! ```
//!
//! Field order is the struct declaration order.  `temp` is a string so the
//! collector always sees exactly four decimals.

use serde::Serialize;

use super::SensorReading;
use crate::config::Settings;

const FAULT_TEMP: &str = "0.0000";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntry {
    pub name: String,
    pub status: bool,
    pub temp: String,
}

impl From<&SensorReading> for SensorEntry {
    fn from(r: &SensorReading) -> Self {
        Self {
            name: format!("Sensor {}", r.channel_index + 1),
            status: r.value.is_some(),
            temp: r
                .value
                .map_or_else(|| FAULT_TEMP.to_owned(), |c| format!("{:.4}", c)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryPayload<'a> {
    pub board: &'a str,
    pub location: &'a str,
    pub sensors: Vec<SensorEntry>,
}

impl<'a> TelemetryPayload<'a> {
    pub fn new(settings: &'a Settings, readings: &[SensorReading]) -> Self {
        Self {
            board: &settings.board_name,
            location: &settings.location,
            sensors: readings.iter().map(SensorEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
