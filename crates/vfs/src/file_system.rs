//! 文件系统抽象
//!
//! 文件系统本身不直接处理文件操作：`mount` 时它为一个设备产生一个驱动实例，
//! VFS 把这个驱动挂到挂载点上；`umount` 时它负责释放该实例。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::info;
use sync::SpinLock;

use crate::{FsError, VfsDriver};

/// 文件系统 trait
///
/// 所有文件系统实现都必须实现此 trait
pub trait FileSystem: Send + Sync {
    /// 文件系统类型名称，在注册表中唯一
    fn fs_type(&self) -> &'static str;

    /// 尝试挂载 `dev_path` 上的设备
    ///
    /// 设备不是本文件系统的格式时返回 [`FsError::NotSupported`]，
    /// 这样不指定类型的 mount 会继续尝试下一个文件系统。
    fn mount(&self, mount_path: &str, dev_path: &str) -> Result<Arc<dyn VfsDriver>, FsError>;

    /// 卸载文件系统（可选）
    fn umount(&self, _mounted: &Arc<dyn VfsDriver>) -> Result<(), FsError> {
        Ok(())
    }
}

/// 已注册的文件系统列表
///
/// 保持注册顺序，不指定类型的 mount 按此顺序逐个探测。
pub struct FsRegistry {
    list: SpinLock<Vec<Arc<dyn FileSystem>>>,
}

impl FsRegistry {
    /// 创建空注册表
    pub const fn new() -> Self {
        Self {
            list: SpinLock::new(Vec::new()),
        }
    }

    /// 注册文件系统，同名文件系统已存在时失败
    pub fn register(&self, fs: Arc<dyn FileSystem>) -> Result<(), FsError> {
        let mut list = self.list.lock();
        if list.iter().any(|f| f.fs_type() == fs.fs_type()) {
            return Err(FsError::AlreadyExists);
        }
        list.try_reserve(1)?;
        info!("vfs: registered filesystem {}", fs.fs_type());
        list.push(fs);
        Ok(())
    }

    /// 按名称查找
    pub fn find(&self, name: &str) -> Option<Arc<dyn FileSystem>> {
        self.list
            .lock()
            .iter()
            .find(|f| f.fs_type() == name)
            .cloned()
    }

    /// 按注册顺序复制一份列表，供锁外探测使用
    pub fn snapshot(&self) -> Result<Vec<Arc<dyn FileSystem>>, FsError> {
        let list = self.list.lock();
        let mut out = Vec::new();
        out.try_reserve_exact(list.len())?;
        out.extend(list.iter().cloned());
        Ok(out)
    }

    /// 已注册的文件系统名称
    pub fn names(&self) -> Vec<String> {
        self.list
            .lock()
            .iter()
            .map(|f| String::from(f.fs_type()))
            .collect()
    }
}

impl Default for FsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
