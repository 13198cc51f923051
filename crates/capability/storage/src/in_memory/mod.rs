//! 内存存储实现模块
//!
//! 网关只有一份汇聚状态，进程重启即清空。

pub mod sensor;

pub use sensor::*;
