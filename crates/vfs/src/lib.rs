//! 内核虚拟文件系统层
//!
//! 所有类文件 I/O（设备、分区、控制台、文件系统中的文件）都经由此 crate
//! 打开、读写、枚举和关闭。主要组成：
//!
//! - 挂载图 - 路径段到驱动的树，支持整段前缀匹配，`/dev` 上的驱动可以服务 `/dev/uart0`
//! - [`VfsDriver`] trait - 驱动钩子表（open/close/read/write/readdir/ioctl）
//! - [`FileSystem`] trait - 文件系统驱动，mount 时产生驱动实例
//! - [`FDTable`] - 进程级文件描述符表，fork 时共享引用计数的 [`SharedDescriptor`]
//! - [`Vfs`] - 组合以上部分的对外接口
//!
//! # 运行时依赖
//!
//! 内核在启动时通过 [`register_vfs_ops`] 提供当前进程的描述符表；
//! 同步原语依赖 `sync` crate 注册的 `ArchOps`。

#![no_std]
#![allow(clippy::module_inception)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod impls;
pub mod ioctl;
pub mod ops;
pub mod path;
pub mod syscall;

mod driver;
mod fcntl;
mod fd_table;
mod file_system;
mod mount;
mod mount_graph;
mod vfs;

#[cfg(test)]
mod tests;

use lazy_static::lazy_static;

// Re-export ops
pub use ops::{VfsOps, register_vfs_ops, try_vfs_ops, vfs_ops};

// Re-export error
pub use error::FsError;

// Re-export fcntl
pub use fcntl::OpenFlags;

// Re-export driver
pub use driver::{DirEntry, DriverHandle, DriverRecord, FileHandle, FileType, ReadDir, VfsDriver};

// Re-export file_system
pub use file_system::{FileSystem, FsRegistry};

// Re-export mount
pub use mount::{MountTable, Resolution};

// Re-export fd_table
pub use fd_table::{FDTable, FdEntry, SharedDescriptor};

// Re-export vfs
pub use vfs::Vfs;

lazy_static! {
    /// 全局 VFS 实例
    pub static ref VFS: Vfs = Vfs::new();
}
