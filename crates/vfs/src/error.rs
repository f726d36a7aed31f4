//! VFS 错误类型
//!
//! 定义了 VFS 内部使用的错误分类，可通过 [`FsError::to_errno()`] 转换为系统调用错误码。
//! 面向进程的 [`crate::syscall`] 接口统一把错误折叠为 `-1`。

use core::fmt;

/// VFS 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    // 参数相关
    /// 无效参数：空路径、越界的 fd 等 (-EINVAL)
    InvalidArgument,
    /// 文件名过长 (-ENAMETOOLONG)
    NameTooLong,

    // 资源耗尽
    /// 内存分配失败 (-ENOMEM)
    NoMemory,
    /// 没有空闲的文件描述符 (-EMFILE)
    TooManyOpenFiles,

    // 查找失败
    /// 没有挂载点或驱动能处理该路径 (-ENOENT)
    NotFound,
    /// fd 槽位为空 (-EBADF)
    BadFileDescriptor,

    // 冲突
    /// 同一路径上已注册驱动 (-EEXIST)
    AlreadyExists,
    /// 资源正被使用 (-EBUSY)
    Busy,

    /// 驱动未提供对应操作 (-ENOTSUP)
    NotSupported,

    /// 打开标志缺少所需的权限位 (-EACCES)
    PermissionDenied,

    /// 驱动层错误，具体原因对 VFS 不透明 (-EIO)
    IoError,
}

impl FsError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            FsError::NotFound => -2,
            FsError::IoError => -5,
            FsError::BadFileDescriptor => -9,
            FsError::NoMemory => -12,
            FsError::PermissionDenied => -13,
            FsError::Busy => -16,
            FsError::AlreadyExists => -17,
            FsError::InvalidArgument => -22,
            FsError::TooManyOpenFiles => -24,
            FsError::NameTooLong => -36,
            FsError::NotSupported => -95,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FsError::InvalidArgument => "invalid argument",
            FsError::NameTooLong => "file name too long",
            FsError::NoMemory => "out of memory",
            FsError::TooManyOpenFiles => "no free file descriptor",
            FsError::NotFound => "no such mount point or file",
            FsError::BadFileDescriptor => "bad file descriptor",
            FsError::AlreadyExists => "a driver is already mounted there",
            FsError::Busy => "resource busy",
            FsError::NotSupported => "operation not supported by driver",
            FsError::PermissionDenied => "permission denied",
            FsError::IoError => "driver I/O error",
        };
        f.write_str(msg)
    }
}

impl From<alloc::collections::TryReserveError> for FsError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        FsError::NoMemory
    }
}
