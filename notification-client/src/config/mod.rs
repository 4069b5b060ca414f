use crate::error::AppError;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the notification REST API
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint for the STOMP push channel
    pub ws_url: String,
    /// Fixed delay between reconnection attempts, in milliseconds
    pub reconnect_delay_ms: u64,
    /// Heartbeat interval advertised in the CONNECT frame, in milliseconds
    pub heartbeat_ms: u64,
    /// Size of the last-N-seen id window used to drop duplicate deliveries
    pub dedup_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let base_url =
            env::var("HMS_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8086".to_string());
        let ws_url =
            env::var("HMS_WS_URL").unwrap_or_else(|_| "ws://localhost:8086/ws".to_string());

        let reconnect_delay_ms = env::var("HMS_RECONNECT_DELAY_MS")
            .ok()
            .map(|v| {
                v.parse()
                    .map_err(|_| AppError::Config("HMS_RECONNECT_DELAY_MS must be an integer".into()))
            })
            .transpose()?
            .unwrap_or(5_000);

        let heartbeat_ms = env::var("HMS_HEARTBEAT_MS")
            .ok()
            .map(|v| {
                v.parse()
                    .map_err(|_| AppError::Config("HMS_HEARTBEAT_MS must be an integer".into()))
            })
            .transpose()?
            .unwrap_or(4_000);

        let dedup_window = env::var("HMS_DEDUP_WINDOW")
            .ok()
            .map(|v| {
                v.parse()
                    .map_err(|_| AppError::Config("HMS_DEDUP_WINDOW must be an integer".into()))
            })
            .transpose()?
            .unwrap_or(64);

        Ok(Self {
            api: ApiConfig { base_url },
            channel: ChannelConfig {
                ws_url,
                reconnect_delay_ms,
                heartbeat_ms,
                dedup_window,
            },
        })
    }

    #[cfg(test)]
    pub fn test_defaults() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8086".into(),
            },
            channel: ChannelConfig {
                ws_url: "ws://localhost:8086/ws".into(),
                reconnect_delay_ms: 10,
                heartbeat_ms: 4_000,
                dedup_window: 64,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.channel.reconnect_delay_ms, 5_000);
        assert_eq!(config.channel.heartbeat_ms, 4_000);
        assert_eq!(config.channel.dedup_window, 64);
        assert!(config.channel.ws_url.ends_with("/ws"));
    }

    #[test]
    fn test_test_defaults_point_at_localhost() {
        let config = Config::test_defaults();
        assert_eq!(config.api.base_url, "http://localhost:8086");
        assert_eq!(config.channel.ws_url, "ws://localhost:8086/ws");
    }
}
