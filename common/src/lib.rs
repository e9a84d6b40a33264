pub mod config;
pub mod protocol;
pub mod snapshot;

pub use config::BridgeConfig;
pub use protocol::DeviceCommand;
pub use snapshot::{SensorReport, SensorSnapshot};
