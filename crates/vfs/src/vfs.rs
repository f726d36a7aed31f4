//! VFS 对外接口
//!
//! [`Vfs`] 把挂载表、文件系统注册表和通用节点驱动组合在一起，
//! 提供 open/close/read/write/readdir/ioctl、mount/unmount、驱动注册
//! 以及描述符表的创建、复制和销毁。
//!
//! 文件操作都显式接收调用进程的 [`FDTable`]；以进程上下文为隐含参数的
//! 接口见 [`crate::syscall`]。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, error, info};

use crate::driver::DriverRecord;
use crate::fd_table::SharedDescriptor;
use crate::impls::GenericNodeDriver;
use crate::mount::{MountTable, Resolution};
use crate::path::{clean_path, is_absolute};
use crate::{
    DriverHandle, FDTable, FdEntry, FileSystem, FsError, FsRegistry, OpenFlags, ReadDir,
    VfsDriver,
};

/// 虚拟文件系统
pub struct Vfs {
    mounts: Arc<MountTable>,
    /// 处理没有驱动的中间节点
    generic: Arc<DriverRecord>,
    filesystems: FsRegistry,
}

impl Vfs {
    /// 创建只有根节点的 VFS
    pub fn new() -> Self {
        Self::with_mount_table(MountTable::new())
    }

    /// 在给定的挂载表上创建 VFS
    pub fn with_mount_table(mounts: MountTable) -> Self {
        let mounts = Arc::new(mounts);
        let generic = Arc::new(DriverRecord::new(Arc::new(GenericNodeDriver::new(
            mounts.clone(),
        ))));
        Self {
            mounts,
            generic,
            filesystems: FsRegistry::new(),
        }
    }

    /// 挂载表
    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    /// 文件系统注册表
    pub fn filesystems(&self) -> &FsRegistry {
        &self.filesystems
    }

    // ========== 驱动与文件系统注册 ==========

    /// 把驱动注册到 `path`
    pub fn register(&self, path: &str, driver: Arc<dyn VfsDriver>) -> Result<DriverHandle, FsError> {
        self.mounts.register(path, DriverRecord::new(driver))
    }

    /// 撤销一次注册
    pub fn unregister(&self, handle: DriverHandle) -> Result<(), FsError> {
        self.mounts.unregister(handle)
    }

    /// 注册文件系统，供 [`Vfs::mount`] 使用
    pub fn register_fs(&self, fs: Arc<dyn FileSystem>) -> Result<(), FsError> {
        self.filesystems.register(fs)
    }

    // ========== 挂载 ==========

    /// 把 `dev_path` 上的设备挂载到 `path`
    ///
    /// 指定 `fs_name` 时只使用该文件系统；否则按注册顺序逐个尝试，
    /// 全部失败时返回 [`FsError::NotSupported`]。
    pub fn mount(&self, path: &str, dev_path: &str, fs_name: Option<&str>) -> Result<(), FsError> {
        let (fs, driver) = match fs_name {
            Some(name) => {
                let Some(fs) = self.filesystems.find(name) else {
                    error!("vfs: could not find filesystem {}", name);
                    return Err(FsError::NotFound);
                };
                let driver = fs.mount(path, dev_path)?;
                (fs, driver)
            }
            None => self.probe(path, dev_path)?,
        };

        let record = DriverRecord::with_unmount(driver.clone(), fs.clone());
        match self.mounts.register(path, record) {
            Ok(_) => {
                info!("vfs: mounted {} on {} as {}", dev_path, path, fs.fs_type());
                Ok(())
            }
            Err(e) => {
                // 挂载点不可用，撤销文件系统这一侧的挂载
                if let Err(ue) = fs.umount(&driver) {
                    error!("vfs: rollback umount of {} failed: {}", dev_path, ue);
                }
                Err(e)
            }
        }
    }

    fn probe(
        &self,
        path: &str,
        dev_path: &str,
    ) -> Result<(Arc<dyn FileSystem>, Arc<dyn VfsDriver>), FsError> {
        for fs in self.filesystems.snapshot()? {
            match fs.mount(path, dev_path) {
                Ok(driver) => return Ok((fs, driver)),
                Err(e) => debug!("vfs: {} rejected {}: {}", fs.fs_type(), dev_path, e),
            }
        }
        Err(FsError::NotSupported)
    }

    /// 卸载挂载在 `path` 上的驱动
    ///
    /// 先在挂载锁下把驱动从挂载图中摘下，再在锁外调用文件系统的卸载钩子；
    /// 钩子失败时驱动被挂回原路径。已经打开的文件继续持有驱动，直到最后一次关闭。
    pub fn unmount(&self, path: &str) -> Result<(), FsError> {
        let record = self.mounts.detach(path)?;
        if let Some(fs) = record.filesystem() {
            if let Err(e) = fs.umount(record.driver()) {
                if let Err(re) = self.mounts.reattach(path, record.clone()) {
                    error!("vfs: cannot restore mount {} after failed umount: {}", path, re);
                }
                return Err(e);
            }
        }
        info!("vfs: unmounted {}", path);
        Ok(())
    }

    // ========== 文件操作 ==========

    /// 打开 `path`，在 `table` 中分配一个 fd
    pub fn open(
        &self,
        table: &FDTable,
        path: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<usize, FsError> {
        if path.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        let clean = clean_path(path)?;
        if !is_absolute(&clean) {
            return Err(FsError::InvalidArgument);
        }

        let resolution = self.mounts.resolve(&clean)?;
        let relative = resolution.relative_path(&clean);
        let record = match resolution {
            Resolution::Driver { record, .. } => record,
            Resolution::Node => self.generic.clone(),
        };

        // 驱动调用之前复制路径，避免句柄打开后才发现内存不足
        let mut owned = String::new();
        owned.try_reserve_exact(clean.len())?;
        owned.push_str(&clean);

        let handle = record.driver().open(relative, flags, mode)?;
        debug!("vfs: opened {} via {}", clean, record.driver().name());

        let shared = Arc::new(SharedDescriptor::new(owned, handle, record));
        match table.install(shared.clone(), flags, mode) {
            Ok(fd) => Ok(fd),
            Err(e) => {
                if let Err(ce) = shared.close_driver() {
                    error!("vfs: close {} after failed install: {}", clean, ce);
                }
                Err(e)
            }
        }
    }

    /// 关闭 fd
    pub fn close(&self, table: &FDTable, fd: usize) -> Result<(), FsError> {
        table.close(fd)
    }

    /// 从 fd 读取，需要 [`OpenFlags::PERM_READ`]
    pub fn read(&self, table: &FDTable, fd: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        let entry = Self::entry_with(table, fd, OpenFlags::PERM_READ)?;
        entry
            .shared
            .driver()
            .driver()
            .read(entry.shared.handle(), buf)
    }

    /// 向 fd 写入，需要 [`OpenFlags::PERM_WRITE`]
    pub fn write(&self, table: &FDTable, fd: usize, buf: &[u8]) -> Result<usize, FsError> {
        let entry = Self::entry_with(table, fd, OpenFlags::PERM_WRITE)?;
        entry
            .shared
            .driver()
            .driver()
            .write(entry.shared.handle(), buf)
    }

    /// 读取下一个目录项，需要 [`OpenFlags::PERM_READ`]
    pub fn readdir(&self, table: &FDTable, fd: usize) -> Result<ReadDir, FsError> {
        let entry = Self::entry_with(table, fd, OpenFlags::PERM_READ)?;
        entry.shared.driver().driver().readdir(entry.shared.handle())
    }

    /// 设备控制操作
    ///
    /// 和读一样需要 [`OpenFlags::PERM_READ`]，与操作本身的语义无关。
    pub fn ioctl(&self, table: &FDTable, fd: usize, op: u32, arg: usize) -> Result<isize, FsError> {
        let entry = Self::entry_with(table, fd, OpenFlags::PERM_READ)?;
        entry
            .shared
            .driver()
            .driver()
            .ioctl(entry.shared.handle(), op, arg)
    }

    fn entry_with(table: &FDTable, fd: usize, perm: OpenFlags) -> Result<FdEntry, FsError> {
        let entry = table.get(fd)?;
        if !entry.flags.contains(perm) {
            return Err(FsError::PermissionDenied);
        }
        Ok(entry)
    }

    // ========== 描述符表生命周期 ==========

    /// 为新进程创建描述符表
    pub fn create_table(&self) -> Result<Arc<FDTable>, FsError> {
        FDTable::new().map(Arc::new)
    }

    /// 为 fork 出的进程复制描述符表
    pub fn copy_table(&self, src: &FDTable) -> Result<Arc<FDTable>, FsError> {
        src.try_clone().map(Arc::new)
    }

    /// 进程退出时销毁描述符表
    ///
    /// 表中所有 fd 立即关闭；其它地方仍持有的 `Arc` 只会看到一张空表。
    pub fn destroy_table(&self, table: Arc<FDTable>) {
        table.close_all();
    }

    /// 所有挂载了驱动的路径
    pub fn list_mounts(&self) -> Vec<String> {
        self.mounts.list_mounts()
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}
