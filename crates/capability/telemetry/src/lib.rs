//! 日志初始化、连接 ID 与基础计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub raw_messages: u64,
    pub updates_applied: u64,
    pub parse_failures: u64,
    pub transport_failures: u64,
    pub publish_cycles: u64,
    pub publish_failures: u64,
    pub point_write_failures: u64,
    pub stale_cycles: u64,
}

/// 进程级计数指标。
pub struct TelemetryMetrics {
    raw_messages: AtomicU64,
    updates_applied: AtomicU64,
    parse_failures: AtomicU64,
    transport_failures: AtomicU64,
    publish_cycles: AtomicU64,
    publish_failures: AtomicU64,
    point_write_failures: AtomicU64,
    stale_cycles: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            raw_messages: AtomicU64::new(0),
            updates_applied: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            publish_cycles: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            point_write_failures: AtomicU64::new(0),
            stale_cycles: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_messages: self.raw_messages.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            publish_cycles: self.publish_cycles.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            point_write_failures: self.point_write_failures.load(Ordering::Relaxed),
            stale_cycles: self.stale_cycles.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 为接入连接生成 connection_id。
pub fn new_connection_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录收到的原始报文次数。
pub fn record_raw_message() {
    metrics().raw_messages.fetch_add(1, Ordering::Relaxed);
}

/// 记录成功写入汇聚状态的更新次数。
pub fn record_update_applied() {
    metrics().updates_applied.fetch_add(1, Ordering::Relaxed);
}

/// 记录解析失败次数。
pub fn record_parse_failure() {
    metrics().parse_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录接入传输失败次数（accept/read/超时）。
pub fn record_transport_failure() {
    metrics().transport_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录发布周期次数。
pub fn record_publish_cycle() {
    metrics().publish_cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录整周期发布失败次数（快照不可用）。
pub fn record_publish_failure() {
    metrics().publish_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录单点写入失败次数。
pub fn record_point_write_failure() {
    metrics().point_write_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录离线周期次数。
pub fn record_stale_cycle() {
    metrics().stale_cycles.fetch_add(1, Ordering::Relaxed);
}
