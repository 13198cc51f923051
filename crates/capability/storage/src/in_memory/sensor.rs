//! 传感器状态内存实现。

use crate::error::StorageError;
use crate::traits::SensorStore;
use domain::{SensorState, TelemetryMessage};
use std::sync::RwLock;
use std::time::Instant;

/// 传感器状态内存存储
pub struct InMemorySensorStore {
    state: RwLock<SensorState>,
}

impl InMemorySensorStore {
    /// 创建初始状态（全零、从未更新）的存储
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SensorState::default()),
        }
    }
}

impl Default for InMemorySensorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SensorStore for InMemorySensorStore {
    async fn apply(&self, message: &TelemetryMessage, at: Instant) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        state.apply(message, at);
        Ok(())
    }

    async fn snapshot(&self) -> Result<SensorState, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(*state)
    }
}
