//! 测试支持 crate
//!
//! 为宿主机上的单元测试与集成测试提供 Mock 实现

#![no_std]

pub mod mock;
