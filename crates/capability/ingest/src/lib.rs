//! # 数据接入能力
//!
//! 现场设备每次建立一条 TCP 连接、推送一行报文后即断开，网关不回任何应答。
//!
//! ```text
//! 现场设备 ──TCP──▶ TcpSource ──RawEvent──▶ RawEventHandler（解析 + 汇聚）
//! ```

use async_trait::async_trait;
use domain::RawEvent;
use std::sync::Arc;
use std::time::Duration;

mod tcp;

pub use tcp::{TcpSource, TcpSourceConfig};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("read timed out after {0:?}")]
    Timeout(Duration),
    #[error("message exceeds {0} bytes without a line terminator")]
    MessageTooLong(usize),
    #[error("connection closed after {0} bytes without a line terminator")]
    Truncated(usize),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// RawEvent 处理器。
#[async_trait]
pub trait RawEventHandler: Send + Sync {
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError>;
}
