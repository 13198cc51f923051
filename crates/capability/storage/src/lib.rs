//! # 传感器状态汇聚
//!
//! 保存所有现场设备上报的最新值，供发布任务周期性读取快照。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`SensorStore` 异步接口（apply / snapshot）
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **实现层** (`in_memory/`)：`RwLock<SensorState>` 内存实现
//!
//! ## 一致性
//!
//! - `apply` 与 `snapshot` 互斥：读者永远看不到写了一半的更新
//! - 状态只由解析成功的报文修改，发布任务只读
//! - `last_update` 是全局的，任意类型的报文都会刷新它
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use scada_storage::{InMemorySensorStore, SensorStore};
//!
//! let store = InMemorySensorStore::new();
//! store.apply(&message, std::time::Instant::now()).await?;
//! let state = store.snapshot().await?;
//! ```

pub mod error;
pub mod in_memory;
pub mod traits;

pub use error::*;
pub use in_memory::InMemorySensorStore;
pub use traits::*;
