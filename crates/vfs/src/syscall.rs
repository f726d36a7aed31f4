//! 面向进程的文件接口
//!
//! 这一层在全局 [`VFS`] 上工作，使用当前进程的描述符表
//! （由 [`crate::VfsOps::current_fd_table`] 提供）；没有当前进程时
//! 使用内核自己的描述符表。所有错误都折叠为 `-1`。

use alloc::sync::Arc;

use lazy_static::lazy_static;
use log::debug;

use crate::config::DEFAULT_MAX_FDS;
use crate::{DirEntry, FDTable, FsError, OpenFlags, ReadDir, VFS, try_vfs_ops};

lazy_static! {
    /// 内核描述符表，没有进程上下文时使用
    pub static ref KERNEL_FD_TABLE: Arc<FDTable> = match FDTable::with_capacity(DEFAULT_MAX_FDS) {
        Ok(table) => Arc::new(table),
        Err(e) => panic!("vfs: cannot allocate kernel fd table: {}", e),
    };
}

/// 当前调用者使用的描述符表
pub fn current_fd_table() -> Arc<FDTable> {
    try_vfs_ops()
        .and_then(|ops| ops.current_fd_table())
        .unwrap_or_else(|| KERNEL_FD_TABLE.clone())
}

fn to_fd(fd: i32) -> Result<usize, FsError> {
    usize::try_from(fd).map_err(|_| FsError::InvalidArgument)
}

fn collapse<T>(op: &str, result: Result<T, FsError>, fail: T) -> T {
    result.unwrap_or_else(|e| {
        debug!("vfs: {} failed: {}", op, e);
        fail
    })
}

/// 打开文件，返回 fd；失败返回 -1
pub fn open(path: &str, flags: u32, mode: u32) -> i32 {
    let flags = OpenFlags::from_bits_truncate(flags);
    let table = current_fd_table();
    let result = VFS.open(&table, path, flags, mode).and_then(|fd| {
        i32::try_from(fd).map_err(|_| FsError::TooManyOpenFiles)
    });
    collapse("open", result, -1)
}

/// 关闭 fd，成功返回 0，失败返回 -1
pub fn close(fd: i32) -> i32 {
    let table = current_fd_table();
    let result = to_fd(fd).and_then(|fd| VFS.close(&table, fd)).map(|()| 0);
    collapse("close", result, -1)
}

/// 读取，返回读到的字节数；失败返回 -1
pub fn read(fd: i32, buf: &mut [u8]) -> isize {
    let table = current_fd_table();
    let result = to_fd(fd)
        .and_then(|fd| VFS.read(&table, fd, buf))
        .map(|n| n as isize);
    collapse("read", result, -1)
}

/// 写入，返回写入的字节数；失败返回 -1
pub fn write(fd: i32, buf: &[u8]) -> isize {
    let table = current_fd_table();
    let result = to_fd(fd)
        .and_then(|fd| VFS.write(&table, fd, buf))
        .map(|n| n as isize);
    collapse("write", result, -1)
}

/// 读取目录项
///
/// 读到目录项时写入 `entry` 并返回 1，目录结束返回 0，出错返回 -1。
pub fn readdir(fd: i32, entry: &mut DirEntry) -> i32 {
    let table = current_fd_table();
    let result = to_fd(fd)
        .and_then(|fd| VFS.readdir(&table, fd))
        .map(|next| match next {
            ReadDir::Entry(e) => {
                *entry = e;
                1
            }
            ReadDir::End => 0,
        });
    collapse("readdir", result, -1)
}

/// 设备控制操作；失败返回 -1
pub fn ioctl(fd: i32, op: u32, arg: usize) -> isize {
    let table = current_fd_table();
    let result = to_fd(fd).and_then(|fd| VFS.ioctl(&table, fd, op, arg));
    collapse("ioctl", result, -1)
}
