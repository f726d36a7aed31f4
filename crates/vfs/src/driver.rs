//! 驱动抽象
//!
//! 每个具体驱动（控制台、磁盘、文件系统实例）都实现 [`VfsDriver`]，
//! 并通过 [`crate::Vfs::register`] 挂到挂载图的某个路径上。
//!
//! 六个钩子都有默认实现：缺省即表示“不支持该操作”，VFS 会把调用
//! 直接失败为 [`FsError::NotSupported`]，而不是当作读写了 0 字节。
//! 唯一的例外是 `close`：未实现时视为关闭成功。

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::mount_graph::NodeId;
use crate::{FileSystem, FsError, OpenFlags};

/// 驱动打开文件后返回的不透明句柄
///
/// 句柄由驱动创建，VFS 只负责保存并在最后一次关闭后释放它。
/// 驱动在其它钩子中通过 `downcast_ref` 取回自己的类型。
pub type FileHandle = Box<dyn Any + Send + Sync>;

/// 目录项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 普通文件
    File,
    /// 目录
    Directory,
}

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 名称（不超过 [`crate::config::MAX_FILENAME_LEN`] 字节）
    pub name: String,
    /// 类型
    pub file_type: FileType,
}

/// `readdir` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadDir {
    /// 读到一个目录项
    Entry(DirEntry),
    /// 目录已经读完
    End,
}

/// 驱动钩子表
///
/// `&self` 就是驱动的私有上下文。钩子可能阻塞任意长时间（例如等待磁盘），
/// VFS 调用它们时不持有任何锁。
pub trait VfsDriver: Send + Sync {
    /// 驱动名称，仅用于日志
    fn name(&self) -> &str {
        "anonymous"
    }

    /// 打开文件，`path` 是相对于挂载点的路径（不含开头的分隔符）
    fn open(&self, _path: &str, _flags: OpenFlags, _mode: u32) -> Result<FileHandle, FsError> {
        Err(FsError::NotSupported)
    }

    /// 关闭文件；每个句柄只会被调用一次，发生在最后一个引用释放时
    fn close(&self, _handle: &dyn Any) -> Result<(), FsError> {
        Ok(())
    }

    /// 读取数据，返回读到的字节数
    fn read(&self, _handle: &dyn Any, _buf: &mut [u8]) -> Result<usize, FsError> {
        Err(FsError::NotSupported)
    }

    /// 写入数据，返回写入的字节数
    fn write(&self, _handle: &dyn Any, _buf: &[u8]) -> Result<usize, FsError> {
        Err(FsError::NotSupported)
    }

    /// 读取下一个目录项
    fn readdir(&self, _handle: &dyn Any) -> Result<ReadDir, FsError> {
        Err(FsError::NotSupported)
    }

    /// 设备相关的控制操作
    fn ioctl(&self, _handle: &dyn Any, _op: u32, _arg: usize) -> Result<isize, FsError> {
        Err(FsError::NotSupported)
    }
}

/// 已注册驱动的记录
///
/// 同一时刻只挂在一个挂载节点上。打开的文件描述符通过 `Arc` 持有它，
/// 因此卸载后已打开的文件仍可以访问驱动，直到最后一个描述符关闭。
pub struct DriverRecord {
    driver: Arc<dyn VfsDriver>,
    /// 由 mount 创建时记录的文件系统，卸载时调用其 `unmount`
    fs: Option<Arc<dyn FileSystem>>,
}

impl DriverRecord {
    /// 创建普通驱动记录
    pub fn new(driver: Arc<dyn VfsDriver>) -> Self {
        Self { driver, fs: None }
    }

    /// 创建带卸载钩子的驱动记录（文件系统挂载使用）
    pub fn with_unmount(driver: Arc<dyn VfsDriver>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            driver,
            fs: Some(fs),
        }
    }

    /// 驱动钩子表
    pub fn driver(&self) -> &Arc<dyn VfsDriver> {
        &self.driver
    }

    /// 卸载钩子所属的文件系统
    pub fn filesystem(&self) -> Option<&Arc<dyn FileSystem>> {
        self.fs.as_ref()
    }
}

impl fmt::Debug for DriverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRecord")
            .field("driver", &self.driver.name())
            .field("fs", &self.fs.as_ref().map(|fs| fs.fs_type()))
            .finish()
    }
}

/// `register` 返回的注册凭据，交给 `unregister` 撤销注册
///
/// 凭据不可复制，因此同一次注册只能被撤销一次。
#[derive(Debug)]
pub struct DriverHandle {
    pub(crate) node: NodeId,
    pub(crate) record: Arc<DriverRecord>,
}

impl DriverHandle {
    /// 注册时使用的驱动记录
    pub fn record(&self) -> &Arc<DriverRecord> {
        &self.record
    }
}
