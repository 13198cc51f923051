//! 点表接口与内存实现

use crate::error::ProtocolError;
use crate::types::{PointUpdate, PointValue};
use async_trait::async_trait;
use std::sync::RwLock;
use tracing::debug;

/// 协议栈点表更新接口
#[async_trait]
pub trait PointDatabase: Send + Sync {
    /// 写入单点；失败不影响同批次其他点
    async fn apply(&self, update: &PointUpdate) -> Result<(), ProtocolError>;
}

/// 点表声明：各类点的数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub binary_count: u16,
    pub analog_count: u16,
    pub counter_count: u16,
}

/// 点表当前值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTables {
    pub binary: Vec<bool>,
    pub analog: Vec<f64>,
    pub counter: Vec<u32>,
}

/// 进程内点表
///
/// 模拟协议栈的数据库：按声明的数量初始化为零值，主站读取的就是这里的值。
pub struct InMemoryPointDatabase {
    tables: RwLock<PointTables>,
}

impl InMemoryPointDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            tables: RwLock::new(PointTables {
                binary: vec![false; usize::from(config.binary_count)],
                analog: vec![0.0; usize::from(config.analog_count)],
                counter: vec![0; usize::from(config.counter_count)],
            }),
        }
    }

    pub fn binary(&self, index: u16) -> Option<bool> {
        let tables = self.tables.read().ok()?;
        tables.binary.get(usize::from(index)).copied()
    }

    pub fn analog(&self, index: u16) -> Option<f64> {
        let tables = self.tables.read().ok()?;
        tables.analog.get(usize::from(index)).copied()
    }

    pub fn counter(&self, index: u16) -> Option<u32> {
        let tables = self.tables.read().ok()?;
        tables.counter.get(usize::from(index)).copied()
    }

    /// 点表整体副本（用于诊断与测试）
    pub fn tables(&self) -> Option<PointTables> {
        self.tables.read().ok().map(|tables| tables.clone())
    }
}

#[async_trait]
impl PointDatabase for InMemoryPointDatabase {
    async fn apply(&self, update: &PointUpdate) -> Result<(), ProtocolError> {
        let index = update.index;
        let kind = update.value.kind();
        if let PointValue::Analog(value) = update.value {
            if !value.is_finite() {
                return Err(ProtocolError::InvalidValue {
                    kind,
                    index,
                    value: value.to_string(),
                });
            }
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| ProtocolError::Rejected("lock failed".to_string()))?;
        let slot = usize::from(index);
        let written = match update.value {
            PointValue::Binary(value) => set_slot(&mut tables.binary, slot, value),
            PointValue::Analog(value) => set_slot(&mut tables.analog, slot, value),
            PointValue::Counter(value) => set_slot(&mut tables.counter, slot, value),
        };
        if !written {
            return Err(ProtocolError::UnknownPoint { kind, index });
        }

        debug!(kind = %kind, index, value = %update.value, "point_updated");
        Ok(())
    }
}

fn set_slot<T>(table: &mut [T], slot: usize, value: T) -> bool {
    match table.get_mut(slot) {
        Some(current) => {
            *current = value;
            true
        }
        None => false,
    }
}
