//! # 发布能力
//!
//! 按固定周期从汇聚状态取快照，计算在线标志，并把数值写入点表。
//!
//! ```text
//! SensorStore::snapshot ─▶ is_live(now, window) ─▶ build_updates ─▶ PointDatabase::apply
//! ```
//!
//! 在线状态只有 LIVE / STALE 两种，每个周期重新计算，不作为持久状态保存。
//! 单点写入失败只记录日志，同周期剩余的点照常写入；下个周期自然重发。

use domain::SensorState;
use scada_protocol::{PointDatabase, PointKind, PointValue};
use scada_storage::SensorStore;
use scada_telemetry::{
    record_point_write_failure, record_publish_cycle, record_publish_failure, record_stale_cycle,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub mod mapping;

pub use mapping::{build_updates, database_config};

/// 发布错误（整周期失败）。
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// 发布参数。
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub interval: Duration,
    pub liveness_window: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            liveness_window: Duration::from_secs(10),
        }
    }
}

/// 单点写入失败。
#[derive(Debug, Clone)]
pub struct PointFailure {
    pub kind: PointKind,
    pub index: u16,
    pub reason: String,
}

/// 单个发布周期的结果。
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub online: bool,
    pub state: SensorState,
    pub attempted: usize,
    pub applied: usize,
    pub failures: Vec<PointFailure>,
}

/// 周期发布器。
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn SensorStore>,
    database: Arc<dyn PointDatabase>,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(store: Arc<dyn SensorStore>, database: Arc<dyn PointDatabase>) -> Self {
        Self::with_config(store, database, PublisherConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn SensorStore>,
        database: Arc<dyn PointDatabase>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            store,
            database,
            config,
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// 以当前时间执行一个发布周期。
    pub async fn publish(&self) -> Result<PublishReport, PublishError> {
        self.publish_at(Instant::now()).await
    }

    /// 以给定时间执行一个发布周期。
    pub async fn publish_at(&self, now: Instant) -> Result<PublishReport, PublishError> {
        record_publish_cycle();
        let state = self.store.snapshot().await.map_err(|err| {
            record_publish_failure();
            PublishError::Storage(err.to_string())
        })?;

        let online = state.is_live(now, self.config.liveness_window);
        if !online {
            record_stale_cycle();
        }

        let updates = build_updates(&state, online);
        let mut attempted = 0;
        let mut failures = Vec::new();
        for update in updates {
            attempted += 1;
            let kind = update.value.kind();
            if let PointValue::Analog(value) = update.value {
                if !value.is_finite() {
                    record_point_write_failure();
                    warn!(
                        target: "scada.publish",
                        kind = %kind,
                        index = update.index,
                        value = %value,
                        "point_value_skipped"
                    );
                    failures.push(PointFailure {
                        kind,
                        index: update.index,
                        reason: "non_finite".to_string(),
                    });
                    continue;
                }
            }

            if let Err(err) = self.database.apply(&update).await {
                record_point_write_failure();
                warn!(
                    target: "scada.publish",
                    kind = %kind,
                    index = update.index,
                    value = %update.value,
                    error = %err,
                    "point_write_failed"
                );
                failures.push(PointFailure {
                    kind,
                    index: update.index,
                    reason: err.to_string(),
                });
            }
        }

        let applied = attempted - failures.len();
        debug!(
            target: "scada.publish",
            online,
            attempted,
            applied,
            "publish_cycle_done"
        );
        Ok(PublishReport {
            online,
            state,
            attempted,
            applied,
            failures,
        })
    }

    /// 周期发布循环，进程存活期间不会返回。
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            target: "scada.publish",
            interval_ms = self.config.interval.as_millis() as u64,
            liveness_window_ms = self.config.liveness_window.as_millis() as u64,
            "publisher_started"
        );

        // 仅用于日志：记录上个周期观察到的在线状态
        let mut last_online: Option<bool> = None;
        loop {
            ticker.tick().await;
            match self.publish().await {
                Ok(report) => {
                    if last_online != Some(report.online) {
                        info!(
                            target: "scada.publish",
                            online = report.online,
                            "liveness_changed"
                        );
                        last_online = Some(report.online);
                    }
                }
                Err(err) => {
                    warn!(target: "scada.publish", error = %err, "publish_failed");
                }
            }
        }
    }
}
