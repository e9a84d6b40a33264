use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use greenhouse_common::DeviceCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::var("GREENHOUSE_BRIDGE_URL")
        .unwrap_or_else(|_| "ws://127.0.0.1:8080/ws/device".to_string());
    let report_secs = std::env::var("GREENHOUSE_REPORT_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(30);

    let (stream, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect to bridge at {url}"))?;
    info!("node connected to {url}");

    let (mut write, mut read) = stream.split();

    let mut relay_state = false;
    let mut fan_state = false;
    let mut tick: u64 = 0;
    let mut interval = tokio::time::interval(Duration::from_secs(report_secs));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick = tick.saturating_add(1);

                // Hardware integration point:
                // replace these simulated readings with DHT22 + capacitive
                // soil probe drivers on the real node.
                let temperature = 21.0 + ((tick % 8) as f64 * 0.2);
                let humidity = 52.0 + ((tick % 6) as f64 * 0.5);
                let soil_moisture = 430.0 - ((tick % 10) as f64 * 3.0);

                let report = serde_json::json!({
                    "temperature": temperature,
                    "humidity": humidity,
                    "soilMoisture": soil_moisture,
                    "relayState": relay_state,
                    "fanState": fan_state,
                })
                .to_string();

                write
                    .send(Message::Text(report.into()))
                    .await
                    .context("failed to send node report")?;
            }
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<DeviceCommand>(text.as_str()) {
                            Ok(DeviceCommand::ToggleRelay { relay_state: value }) => {
                                relay_state = value;
                                info!(relay_state, "relay switched");
                            }
                            Ok(DeviceCommand::ToggleFan { fan_state: value }) => {
                                fan_state = value;
                                info!(fan_state, "fan switched");
                            }
                            Err(err) => warn!("unrecognized bridge frame: {err}"),
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        write
                            .send(Message::Pong(payload))
                            .await
                            .context("failed to answer bridge ping")?;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("bridge closed the connection");
                        break;
                    }
                    Some(Err(err)) => {
                        warn!("bridge socket error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    Ok(())
}
