use serde::{Deserialize, Serialize};

/// Actuator commands the bridge forwards to the node over the device socket.
/// The frame shape is part of the node firmware's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum DeviceCommand {
    #[serde(rename = "toggleRelay")]
    ToggleRelay {
        #[serde(rename = "relayState")]
        relay_state: bool,
    },
    #[serde(rename = "toggleFan")]
    ToggleFan {
        #[serde(rename = "fanState")]
        fan_state: bool,
    },
}

impl DeviceCommand {
    pub fn to_frame(self) -> serde_json::Result<String> {
        serde_json::to_string(&self)
    }
}
