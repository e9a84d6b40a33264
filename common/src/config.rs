use serde::{Deserialize, Serialize};

pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub http_port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let http_port = std::env::var("GREENHOUSE_HTTP_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        Self { http_port }
    }
}
