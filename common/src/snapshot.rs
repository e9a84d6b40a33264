use serde::{Deserialize, Serialize};

/// Last-known readings and actuator states for the garden node. One instance
/// lives for the whole process; readings stay `None` until the node reports
/// them and then keep the last value with no expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    #[serde(rename = "relayState")]
    pub relay_state: bool,
    #[serde(rename = "fanState")]
    pub fan_state: bool,
}

/// Partial readings from the node. Absent fields leave the stored value
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    #[serde(rename = "soilMoisture")]
    pub soil_moisture: Option<f64>,
}

impl SensorSnapshot {
    pub fn apply_report(&mut self, report: &SensorReport) {
        if let Some(temperature) = report.temperature {
            self.temperature = Some(temperature);
        }
        if let Some(humidity) = report.humidity {
            self.humidity = Some(humidity);
        }
        if let Some(soil_moisture) = report.soil_moisture {
            self.soil_moisture = Some(soil_moisture);
        }
    }

    pub fn toggle_relay(&mut self) -> bool {
        self.relay_state = !self.relay_state;
        self.relay_state
    }

    pub fn toggle_fan(&mut self) -> bool {
        self.fan_state = !self.fan_state;
        self.fan_state
    }
}
