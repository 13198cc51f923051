//! 接入链路装配模块
//!
//! 把 TCP 接入源、报文解析器和汇聚状态组装成完整的接入链路：
//! 每条报文解析成功后写入汇聚状态，失败只记录日志与指标，发送方不会得到任何反馈。

use domain::RawEvent;
use scada_config::GatewayConfig;
use scada_ingest::{IngestError, RawEventHandler, Source, TcpSource, TcpSourceConfig};
use scada_normalize::MessageParser;
use scada_storage::SensorStore;
use scada_telemetry::{record_parse_failure, record_raw_message, record_update_applied};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 遥测处理器
///
/// 实现 `RawEventHandler`：原始报文 → 类型化更新 → 汇聚状态。
pub struct TelemetryHandler {
    parser: MessageParser,
    store: Arc<dyn SensorStore>,
}

impl TelemetryHandler {
    pub fn new(parser: MessageParser, store: Arc<dyn SensorStore>) -> Self {
        Self { parser, store }
    }
}

#[async_trait::async_trait]
impl RawEventHandler for TelemetryHandler {
    async fn handle(&self, event: RawEvent) -> Result<(), IngestError> {
        record_raw_message();
        debug!(
            target: "scada.ingest",
            connection_id = %event.connection_id,
            peer = %event.peer,
            payload_size = event.payload.len(),
            "raw_event_received"
        );

        let message = match self.parser.parse(&event.payload) {
            Ok(message) => message,
            Err(err) => {
                // 解析失败不是传输错误：记录后正常返回，不影响监听
                record_parse_failure();
                let payload = String::from_utf8_lossy(&event.payload);
                warn!(
                    target: "scada.ingest",
                    connection_id = %event.connection_id,
                    peer = %event.peer,
                    reason = err.reason(),
                    error = %err,
                    payload = %payload.trim_end(),
                    "parse_failed"
                );
                return Ok(());
            }
        };

        self.store
            .apply(&message, event.received_at)
            .await
            .map_err(|err| IngestError::Handler(err.to_string()))?;
        record_update_applied();

        info!(
            target: "scada.ingest",
            connection_id = %event.connection_id,
            device_id = message.device_id,
            kind = message.update.kind(),
            update = ?message.update,
            "telemetry_applied"
        );
        Ok(())
    }
}

/// 启动接入任务
///
/// 任务只在监听地址绑定失败等不可恢复错误时结束。
pub fn spawn_ingest(
    config: &GatewayConfig,
    store: Arc<dyn SensorStore>,
) -> tokio::task::JoinHandle<Result<(), IngestError>> {
    let handler = Arc::new(TelemetryHandler::new(MessageParser::default(), store));
    let source = TcpSource::new(TcpSourceConfig {
        listen_addr: config.ingest_addr.clone(),
        max_message_bytes: config.ingest_max_message_bytes,
        read_timeout: config.ingest_read_timeout(),
        max_connections: config.ingest_max_connections,
    });
    info!(
        target: "scada.ingest",
        addr = %config.ingest_addr,
        max_message_bytes = config.ingest_max_message_bytes,
        "ingest source: tcp"
    );

    tokio::spawn(async move { source.run(handler).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{MotionState, SensorState};
    use scada_storage::InMemorySensorStore;
    use std::net::SocketAddr;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    fn raw(payload: &[u8]) -> RawEvent {
        RawEvent {
            connection_id: "conn-1".to_string(),
            peer: "127.0.0.1:50000".to_string(),
            payload: payload.to_vec(),
            received_at: Instant::now(),
        }
    }

    fn handler() -> (Arc<InMemorySensorStore>, TelemetryHandler) {
        let store = Arc::new(InMemorySensorStore::new());
        let handler = TelemetryHandler::new(MessageParser::default(), store.clone());
        (store, handler)
    }

    #[tokio::test]
    async fn valid_message_updates_state() {
        let (store, handler) = handler();
        let event = raw(b"DEV=0,TYPE=ENV,TEMP=23.5,HUM=44.0\n");
        let received_at = event.received_at;
        handler.handle(event).await.expect("handle");

        let state = store.snapshot().await.expect("snapshot");
        assert_eq!(state.temperature, 23.5);
        assert_eq!(state.humidity, 44.0);
        assert_eq!(state.last_device_id, Some(0));
        assert!(state.is_live(received_at, Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn malformed_messages_leave_state_unchanged() {
        let (store, handler) = handler();
        handler
            .handle(raw(b"DEV=2,TYPE=SENSOR,GPIO=18,STATE=1\n"))
            .await
            .expect("handle");
        let before = store.snapshot().await.expect("snapshot");

        let before_failures = scada_telemetry::metrics().snapshot().parse_failures;
        let payloads: [&[u8]; 5] = [
            b"garbage without tokens",
            b"DEV=1,TYPE=BOGUS,X=1\n",
            b"DEV=0,TYPE=ENV,TEMP=23.5\n",
            b"DEV=0,TYPE=ENV,TEMP=hot,HUM=1\n",
            &[0xde, 0xad, 0xbe, 0xef],
        ];
        for payload in payloads {
            handler.handle(raw(payload)).await.expect("parse errors are not fatal");
        }

        let after = store.snapshot().await.expect("snapshot");
        assert_eq!(before, after);
        let after_failures = scada_telemetry::metrics().snapshot().parse_failures;
        assert!(after_failures >= before_failures + 5);
    }

    async fn serve(store: Arc<InMemorySensorStore>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let mut config = TcpSourceConfig::new(addr.to_string());
        config.read_timeout = Duration::from_secs(1);
        let source = TcpSource::new(config);
        let handler: Arc<dyn RawEventHandler> =
            Arc::new(TelemetryHandler::new(MessageParser::default(), store));
        tokio::spawn(async move {
            let _ = source.serve(listener, handler).await;
        });
        addr
    }

    async fn send(addr: SocketAddr, payload: &[u8]) {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(payload).await.expect("write");
        stream.shutdown().await.expect("shutdown");
    }

    async fn wait_for<F>(store: &InMemorySensorStore, predicate: F) -> SensorState
    where
        F: Fn(&SensorState) -> bool,
    {
        for _ in 0..100 {
            let state = store.snapshot().await.expect("snapshot");
            if predicate(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("state did not reach expected value");
    }

    #[tokio::test]
    async fn tcp_messages_reach_aggregator() {
        let store = Arc::new(InMemorySensorStore::new());
        let addr = serve(store.clone()).await;

        send(addr, b"DEV=2,TYPE=SENSOR,GPIO=18,STATE=1\n").await;
        let state = wait_for(&store, |s| s.motion == MotionState::Active).await;
        assert_eq!(state.last_device_id, Some(2));

        send(addr, b"DEV=1,TYPE=KEYPAD,KEY=7\n").await;
        wait_for(&store, |s| s.keypad_last_key == 7).await;

        send(addr, b"DEV=1,TYPE=KEYPAD,KEY=A\n").await;
        wait_for(&store, |s| s.keypad_last_key == 65).await;
    }

    #[tokio::test]
    async fn partial_line_over_tcp_is_not_applied() {
        let store = Arc::new(InMemorySensorStore::new());
        let addr = serve(store.clone()).await;

        // 对端在换行前关闭：前缀 "HUM=4" 本身语法合法，但不能写入状态
        send(addr, b"DEV=0,TYPE=ENV,TEMP=23.5,HUM=4").await;
        send(addr, b"DEV=1,TYPE=KEYPAD,KEY=7\n").await;
        let state = wait_for(&store, |s| s.keypad_last_key == 7).await;

        assert_eq!(state.temperature, 0.0);
        assert_eq!(state.humidity, 0.0);
        assert_eq!(state.last_device_id, Some(1));
    }

    #[tokio::test]
    async fn garbage_over_tcp_keeps_listener_available() {
        let store = Arc::new(InMemorySensorStore::new());
        let addr = serve(store.clone()).await;

        send(addr, b"\x01\x02 not a telemetry line\n").await;
        send(addr, b"DEV=0,TYPE=ENV,TEMP=23.5,HUM=44.0\n").await;
        let state = wait_for(&store, |s| s.last_update.is_some()).await;

        // 垃圾报文没有产生任何更新，第一次更新就是温湿度
        assert_eq!(state.temperature, 23.5);
        assert_eq!(state.humidity, 44.0);
        assert_eq!(state.keypad_last_key, 0);
    }
}
