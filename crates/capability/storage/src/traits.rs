//! 状态存储接口定义

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{SensorState, TelemetryMessage};
use std::time::Instant;

/// 传感器状态存储接口
///
/// 两个操作互斥执行，快照反映的一定是若干次完整 `apply` 之后的状态。
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// 应用一条解析成功的报文，并把 `last_update` 刷新为 `at`
    async fn apply(&self, message: &TelemetryMessage, at: Instant) -> Result<(), StorageError>;

    /// 获取完整状态的时点副本
    async fn snapshot(&self) -> Result<SensorState, StorageError>;
}
