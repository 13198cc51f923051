//! TCP 接入源
//!
//! 监听 TCP 端口，每条连接读取一条报文后关闭。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = TcpSourceConfig::new("0.0.0.0:9100");
//! let source = TcpSource::new(config);
//! source.run(handler).await?;
//! ```
//!
//! 每条连接在独立任务中处理，读取受 `read_timeout` 约束，卡住的对端
//! 不会阻塞后续接入；并发连接数受 `max_connections` 限制。

use crate::{IngestError, RawEventHandler, Source};
use async_trait::async_trait;
use domain::RawEvent;
use scada_telemetry::{new_connection_id, record_transport_failure};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP 接入源配置
#[derive(Debug, Clone)]
pub struct TcpSourceConfig {
    /// 监听地址
    pub listen_addr: String,
    /// 单条报文最大字节数（含换行符）
    pub max_message_bytes: usize,
    /// 单连接读超时
    pub read_timeout: Duration,
    /// 最大并发连接数
    pub max_connections: usize,
}

impl TcpSourceConfig {
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            max_message_bytes: 256,
            read_timeout: Duration::from_secs(5),
            max_connections: 64,
        }
    }
}

/// TCP 接入源
pub struct TcpSource {
    config: TcpSourceConfig,
}

impl TcpSource {
    /// 创建新的 TCP 接入源
    pub fn new(config: TcpSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TcpSourceConfig {
        &self.config
    }

    /// 在已绑定的监听器上运行接入循环（永不主动返回）
    pub async fn serve(
        &self,
        listener: TcpListener,
        handler: Arc<dyn RawEventHandler>,
    ) -> Result<(), IngestError> {
        let limiter = Arc::new(Semaphore::new(self.config.max_connections.max(1)));
        let max_bytes = self.config.max_message_bytes.max(1);
        let read_timeout = self.config.read_timeout;

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    record_transport_failure();
                    error!(target: "scada.ingest", error = %e, "accept_failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            // 达到并发上限时在此等待，新连接留在内核 backlog 中
            let permit = Arc::clone(&limiter)
                .acquire_owned()
                .await
                .map_err(|_| IngestError::Source("connection limiter closed".to_string()))?;

            let handler = Arc::clone(&handler);
            let connection_id = new_connection_id();
            let span = tracing::info_span!(
                "connection",
                connection_id = %connection_id,
                peer = %peer_addr
            );

            tokio::spawn(
                async move {
                    let _permit = permit;
                    if let Err(e) = Self::handle_connection(
                        stream,
                        connection_id,
                        peer_addr.to_string(),
                        handler,
                        max_bytes,
                        read_timeout,
                    )
                    .await
                    {
                        warn!(target: "scada.ingest", error = %e, "connection_failed");
                    }
                }
                .instrument(span),
            );
        }
    }

    /// 处理单个连接：读一条报文、关闭连接、交给处理器
    async fn handle_connection(
        mut stream: TcpStream,
        connection_id: String,
        peer: String,
        handler: Arc<dyn RawEventHandler>,
        max_bytes: usize,
        read_timeout: Duration,
    ) -> Result<(), IngestError> {
        let read = tokio::time::timeout(read_timeout, read_message(&mut stream, max_bytes)).await;
        drop(stream);

        let payload = match read {
            Ok(Ok(payload)) => payload,
            Ok(Err(e)) => {
                record_transport_failure();
                return Err(e);
            }
            Err(_) => {
                record_transport_failure();
                return Err(IngestError::Timeout(read_timeout));
            }
        };

        if payload.is_empty() {
            debug!(target: "scada.ingest", "empty_message");
            return Ok(());
        }

        let event = RawEvent {
            connection_id,
            peer,
            payload,
            received_at: Instant::now(),
        };
        handler.handle(event).await
    }
}

#[async_trait]
impl Source for TcpSource {
    async fn run(&self, handler: Arc<dyn RawEventHandler>) -> Result<(), IngestError> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!(
            target: "scada.ingest",
            addr = %self.config.listen_addr,
            read_timeout_ms = self.config.read_timeout.as_millis() as u64,
            max_connections = self.config.max_connections,
            "ingest_listening"
        );
        self.serve(listener, handler).await
    }
}

/// 读取一行报文，帧只以换行符结束
///
/// 对端在换行前关闭连接视为截断，缓冲区写满仍无换行视为超长，两者都丢弃。
/// 未发送任何字节即关闭的连接返回空报文。
async fn read_message(stream: &mut TcpStream, max_bytes: usize) -> Result<Vec<u8>, IngestError> {
    let mut buf = vec![0u8; max_bytes];
    let mut filled = 0;
    loop {
        if filled == max_bytes {
            return Err(IngestError::MessageTooLong(max_bytes));
        }
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(Vec::new());
            }
            return Err(IngestError::Truncated(filled));
        }
        let start = filled;
        filled += n;
        if let Some(pos) = buf[start..filled].iter().position(|b| *b == b'\n') {
            // 换行之后的内容不属于本条报文
            buf.truncate(start + pos + 1);
            return Ok(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn test_read_message_stops_at_first_newline() {
        let (mut client, mut server) = pair().await;
        client.write_all(b"DEV=1,TYPE=KEYPAD,KEY=7\nextra").await.unwrap();
        let payload = read_message(&mut server, 256).await.unwrap();
        assert_eq!(payload, b"DEV=1,TYPE=KEYPAD,KEY=7\n");
    }

    #[tokio::test]
    async fn test_read_message_accepts_line_filling_buffer() {
        let (mut client, mut server) = pair().await;
        let line = b"DEV=1,TYPE=KEYPAD,KEY=7\n";
        client.write_all(line).await.unwrap();
        let payload = read_message(&mut server, line.len()).await.unwrap();
        assert_eq!(payload, line);
    }

    #[tokio::test]
    async fn test_read_message_rejects_line_without_terminator_at_limit() {
        let (mut client, mut server) = pair().await;
        client
            .write_all(b"DEV=0,TYPE=ENV,TEMP=23.5,HUM=44.0\n")
            .await
            .unwrap();
        let err = read_message(&mut server, 30).await.unwrap_err();
        assert!(matches!(err, IngestError::MessageTooLong(30)));
    }

    #[tokio::test]
    async fn test_read_message_rejects_eof_before_newline() {
        let (mut client, mut server) = pair().await;
        client.write_all(b"DEV=0,TYPE=ENV,TEMP=23.5,HUM=4").await.unwrap();
        client.shutdown().await.unwrap();
        let err = read_message(&mut server, 256).await.unwrap_err();
        assert!(matches!(err, IngestError::Truncated(30)));
    }

    #[tokio::test]
    async fn test_read_message_returns_empty_on_immediate_eof() {
        let (mut client, mut server) = pair().await;
        client.shutdown().await.unwrap();
        let payload = read_message(&mut server, 256).await.unwrap();
        assert!(payload.is_empty());
    }
}
