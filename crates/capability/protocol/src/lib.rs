//! # 点表边界
//!
//! 工业轮询协议栈（外部组件）持有点表、会话与报文编码；网关只通过一个
//! 很窄的更新接口把数值写进去：
//!
//! ```text
//! Publisher
//!     │  UpdateBuilder → Updates
//!     ▼
//! PointDatabase::apply(PointUpdate)
//!     │
//!     ├── InMemoryPointDatabase（进程内点表，测试与独立运行）
//!     └── 外部协议栈适配（实现同一 trait）
//!     ▼
//! 主站轮询
//! ```
//!
//! ## 点类型
//!
//! - **Binary**：遥信（布尔）
//! - **Analog**：遥测（浮点）
//! - **Counter**：计数（u32）
//!
//! 点表在创建时声明各类点的数量（[`DatabaseConfig`]），写入未声明的索引
//! 或非有限的模拟量会被拒绝。

mod database;
mod error;
mod types;

pub use database::{DatabaseConfig, InMemoryPointDatabase, PointDatabase, PointTables};
pub use error::ProtocolError;
pub use types::*;
