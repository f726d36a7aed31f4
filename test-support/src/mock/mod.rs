//! Mock 实现模块
//!
//! 提供架构相关操作的 Mock 实现，供 `sync` 与 `vfs` 的测试使用

pub mod arch;
