//! 网关运行配置加载。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub ingest_addr: String,
    pub ingest_read_timeout_ms: u64,
    pub ingest_max_message_bytes: usize,
    pub ingest_max_connections: usize,
    pub publish_interval_ms: u64,
    pub liveness_window_seconds: u64,
}

impl GatewayConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let ingest_addr =
            env::var("SCADA_INGEST_ADDR").unwrap_or_else(|_| "0.0.0.0:9100".to_string());
        let ingest_read_timeout_ms = read_positive_u64("SCADA_INGEST_READ_TIMEOUT_MS", 5000)?;
        let ingest_max_message_bytes =
            read_positive_usize("SCADA_INGEST_MAX_MESSAGE_BYTES", 256)?;
        let ingest_max_connections = read_positive_usize("SCADA_INGEST_MAX_CONNECTIONS", 64)?;
        let publish_interval_ms = read_positive_u64("SCADA_PUBLISH_INTERVAL_MS", 1000)?;
        let liveness_window_seconds = read_positive_u64("SCADA_LIVENESS_WINDOW_SECONDS", 10)?;

        Ok(Self {
            ingest_addr,
            ingest_read_timeout_ms,
            ingest_max_message_bytes,
            ingest_max_connections,
            publish_interval_ms,
            liveness_window_seconds,
        })
    }

    pub fn ingest_read_timeout(&self) -> Duration {
        Duration::from_millis(self.ingest_read_timeout_ms)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn liveness_window(&self) -> Duration {
        Duration::from_secs(self.liveness_window_seconds)
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

/// 读取必须大于 0 的 u64（超时、周期、窗口为 0 没有意义）。
fn read_positive_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = read_u64_with_default(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid(key.to_string(), value.to_string()));
    }
    Ok(value)
}

fn read_positive_usize(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = read_positive_u64(key, default as u64)?;
    usize::try_from(value).map_err(|_| ConfigError::Invalid(key.to_string(), value.to_string()))
}
