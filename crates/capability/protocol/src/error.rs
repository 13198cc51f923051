//! 点表错误类型定义

use crate::types::PointKind;

/// 点表更新错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 索引未在点表中声明
    #[error("unknown {kind} point: {index}")]
    UnknownPoint { kind: PointKind, index: u16 },

    /// 数值不可写入（NaN / 无穷大）
    #[error("invalid value for {kind} point {index}: {value}")]
    InvalidValue {
        kind: PointKind,
        index: u16,
        value: String,
    },

    /// 协议栈拒绝更新
    #[error("update rejected: {0}")]
    Rejected(String),
}
