//! 现场设备遥测网关：TCP 接入 + 周期发布到点表。

mod ingest;

use ingest::spawn_ingest;
use scada_config::GatewayConfig;
use scada_pipeline::{Publisher, PublisherConfig, database_config};
use scada_protocol::InMemoryPointDatabase;
use scada_storage::{InMemorySensorStore, SensorStore};
use scada_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = GatewayConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 单例汇聚状态：接入任务写，发布任务读
    let store: Arc<dyn SensorStore> = Arc::new(InMemorySensorStore::new());
    // 点表：协议栈从这里向主站提供数据
    let database = Arc::new(InMemoryPointDatabase::new(database_config()));

    let ingest = spawn_ingest(&config, store.clone());

    let publisher = Publisher::with_config(
        store,
        database,
        PublisherConfig {
            interval: config.publish_interval(),
            liveness_window: config.liveness_window(),
        },
    );
    let publish = tokio::spawn(async move { publisher.run().await });

    info!(
        ingest_addr = %config.ingest_addr,
        publish_interval_ms = config.publish_interval_ms,
        liveness_window_seconds = config.liveness_window_seconds,
        "gateway_started"
    );

    // 两个任务都不会正常结束；任一结束即视为故障退出
    let reason = tokio::select! {
        result = ingest => match result {
            Ok(Ok(())) => "ingest task ended".to_string(),
            Ok(Err(err)) => format!("ingest task failed: {}", err),
            Err(err) => format!("ingest task panicked: {}", err),
        },
        result = publish => match result {
            Ok(()) => "publish task ended".to_string(),
            Err(err) => format!("publish task panicked: {}", err),
        },
    };
    let counters = metrics().snapshot();
    error!(reason = %reason, counters = ?counters, "gateway_stopped");
    Err(reason.into())
}
