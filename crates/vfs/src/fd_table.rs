//! 文件描述符表
//!
//! 每个进程持有一张 [`FDTable`]。表在创建时分配固定数量的槽位，
//! 空闲槽位编号放在一个先进先出的空闲队列里，分配与释放都是 O(1)。
//!
//! 约定与语义：
//!
//! - 每次 `open` 都产生一个新的 [`SharedDescriptor`]，引用计数为 1
//! - 复制整张表（fork）时，已占用槽位共享同一个 `SharedDescriptor`，引用计数加一
//! - 驱动的 `close` 钩子只在引用计数从 1 变为 0 时调用，且只调用一次
//! - 驱动 `close` 失败时，描述符保持打开，调用者可以重试

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use log::{debug, warn};
use sync::SpinLock;

use crate::config::DEFAULT_MAX_FDS;
use crate::driver::{DriverRecord, FileHandle};
use crate::{FsError, OpenFlags, try_vfs_ops};

/// 释放一个引用后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// 仍有其它引用
    Shared,
    /// 释放的是最后一个引用，调用者负责关闭驱动句柄
    Last,
}

/// 被一个或多个文件描述符共享的打开文件
pub struct SharedDescriptor {
    /// 打开时使用的清理后的绝对路径
    path: String,
    /// 驱动返回的句柄
    handle: FileHandle,
    /// 打开该文件的驱动；持有它使驱动在卸载后仍然可用
    driver: Arc<DriverRecord>,
    refs: SpinLock<usize>,
}

impl SharedDescriptor {
    pub(crate) fn new(path: String, handle: FileHandle, driver: Arc<DriverRecord>) -> Self {
        Self {
            path,
            handle,
            driver,
            refs: SpinLock::new(1),
        }
    }

    /// 打开时使用的路径
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 打开该文件的驱动记录
    pub fn driver(&self) -> &Arc<DriverRecord> {
        &self.driver
    }

    /// 驱动句柄
    pub fn handle(&self) -> &dyn Any {
        &*self.handle
    }

    /// 当前引用计数
    pub fn ref_count(&self) -> usize {
        *self.refs.lock()
    }

    fn acquire(&self) {
        let mut refs = self.refs.lock();
        if *refs == 0 {
            panic!("vfs: acquiring a released descriptor for {}", self.path);
        }
        *refs += 1;
    }

    fn release(&self) -> Release {
        let mut refs = self.refs.lock();
        match *refs {
            0 => panic!("vfs: descriptor for {} released twice", self.path),
            1 => {
                *refs = 0;
                Release::Last
            }
            _ => {
                *refs -= 1;
                Release::Shared
            }
        }
    }

    /// 驱动关闭失败后恢复最后一个引用
    fn restore(&self) {
        let mut refs = self.refs.lock();
        if *refs != 0 {
            panic!("vfs: restoring a live descriptor for {}", self.path);
        }
        *refs = 1;
    }

    /// 调用驱动的 `close` 钩子，调用时不持有任何锁
    pub(crate) fn close_driver(&self) -> Result<(), FsError> {
        self.driver.driver().close(&*self.handle)
    }
}

impl fmt::Debug for SharedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDescriptor")
            .field("path", &self.path)
            .field("driver", &self.driver.driver().name())
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// 描述符表中的一项
#[derive(Debug, Clone)]
pub struct FdEntry {
    /// 共享的打开文件
    pub shared: Arc<SharedDescriptor>,
    /// 打开标志
    pub flags: OpenFlags,
    /// 打开模式，原样传给驱动
    pub mode: u32,
}

#[derive(Debug)]
enum Slot {
    Free,
    Open(FdEntry),
    /// 正在关闭，驱动 `close` 钩子执行期间占住槽位
    Closing,
}

struct Inner {
    slots: Vec<Slot>,
    free: VecDeque<usize>,
}

/// 文件描述符表
pub struct FDTable {
    inner: SpinLock<Inner>,
    capacity: usize,
}

impl fmt::Debug for FDTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FDTable")
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .finish()
    }
}

impl FDTable {
    /// 创建新的文件描述符表，容量取自 [`crate::VfsOps::default_max_fds`]
    pub fn new() -> Result<Self, FsError> {
        let capacity = try_vfs_ops()
            .map(|ops| ops.default_max_fds())
            .unwrap_or(DEFAULT_MAX_FDS);
        Self::with_capacity(capacity)
    }

    /// 创建有 `capacity` 个槽位的文件描述符表
    ///
    /// fd 要能表示为 `i32`，容量超过 `i32::MAX` 时返回 [`FsError::InvalidArgument`]。
    pub fn with_capacity(capacity: usize) -> Result<Self, FsError> {
        if i32::try_from(capacity).is_err() {
            return Err(FsError::InvalidArgument);
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || Slot::Free);

        let mut free = VecDeque::new();
        free.try_reserve_exact(capacity)?;
        free.extend(0..capacity);

        Ok(Self {
            inner: SpinLock::new(Inner { slots, free }),
            capacity,
        })
    }

    /// 槽位总数
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 已占用的槽位数（含正在关闭的）
    pub fn used(&self) -> usize {
        self.capacity - self.inner.lock().free.len()
    }

    /// 把一个新打开的文件放进空闲槽位，返回 fd
    pub(crate) fn install(
        &self,
        shared: Arc<SharedDescriptor>,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<usize, FsError> {
        let mut inner = self.inner.lock();
        let fd = inner.free.pop_front().ok_or(FsError::TooManyOpenFiles)?;
        let slot = &mut inner.slots[fd];
        if !matches!(slot, Slot::Free) {
            panic!("vfs: fd {} in free queue is not free", fd);
        }
        *slot = Slot::Open(FdEntry {
            shared,
            flags,
            mode,
        });
        Ok(fd)
    }

    /// 获取 fd 对应的表项
    ///
    /// 返回的是表项的副本，调用者在锁外使用其中的驱动。
    pub fn get(&self, fd: usize) -> Result<FdEntry, FsError> {
        let inner = self.inner.lock();
        match inner.slots.get(fd) {
            None => Err(FsError::InvalidArgument),
            Some(Slot::Open(entry)) => Ok(entry.clone()),
            Some(_) => Err(FsError::BadFileDescriptor),
        }
    }

    /// 关闭文件描述符
    ///
    /// 释放最后一个引用时调用驱动的 `close` 钩子；钩子失败则 fd 保持打开并返回错误。
    pub fn close(&self, fd: usize) -> Result<(), FsError> {
        let entry = {
            let mut inner = self.inner.lock();
            let slot = inner.slots.get_mut(fd).ok_or(FsError::InvalidArgument)?;
            match core::mem::replace(slot, Slot::Closing) {
                Slot::Open(entry) => entry,
                other => {
                    *slot = other;
                    return Err(FsError::BadFileDescriptor);
                }
            }
        };

        if entry.shared.release() == Release::Last {
            if let Err(e) = entry.shared.close_driver() {
                warn!("vfs: close {} failed: {}", entry.shared.path(), e);
                entry.shared.restore();
                self.inner.lock().slots[fd] = Slot::Open(entry);
                return Err(e);
            }
            debug!("vfs: closed {}", entry.shared.path());
        }

        let mut inner = self.inner.lock();
        inner.slots[fd] = Slot::Free;
        // 空闲队列的容量等于槽位数，不会再分配
        inner.free.push_back(fd);
        Ok(())
    }

    /// 复制整张表（用于 fork）
    ///
    /// 已打开的槽位与原表共享同一个 [`SharedDescriptor`]。中途分配失败时，
    /// 已经复制的引用会全部释放，不会留下半成品。
    pub fn try_clone(&self) -> Result<Self, FsError> {
        self.clone_within(usize::MAX)
    }

    /// 与 [`FDTable::try_clone`] 相同，但最多复制 `budget` 个槽位，
    /// 超出部分按内存不足处理
    pub(crate) fn clone_within(&self, budget: usize) -> Result<Self, FsError> {
        let mut slots: Vec<Slot> = Vec::new();
        let mut free = VecDeque::new();

        let result = {
            let inner = self.inner.lock();
            Self::copy_slots(&inner, budget, &mut slots, &mut free)
        };

        match result {
            Ok(()) => Ok(Self {
                inner: SpinLock::new(Inner { slots, free }),
                capacity: self.capacity,
            }),
            Err(e) => {
                Self::unwind(slots);
                Err(e)
            }
        }
    }

    fn copy_slots(
        src: &Inner,
        budget: usize,
        slots: &mut Vec<Slot>,
        free: &mut VecDeque<usize>,
    ) -> Result<(), FsError> {
        for (fd, slot) in src.slots.iter().enumerate() {
            if fd >= budget {
                return Err(FsError::NoMemory);
            }
            slots.try_reserve(1)?;
            match slot {
                Slot::Open(entry) => {
                    entry.shared.acquire();
                    slots.push(Slot::Open(entry.clone()));
                }
                // 正在关闭的槽位在新表里是空闲的
                Slot::Free | Slot::Closing => {
                    free.try_reserve(1)?;
                    slots.push(Slot::Free);
                    free.push_back(fd);
                }
            }
        }
        Ok(())
    }

    fn unwind(slots: Vec<Slot>) {
        for slot in slots {
            if let Slot::Open(entry) = slot {
                Self::release_entry(entry);
            }
        }
    }

    /// 关闭表中所有文件描述符（用于进程退出）
    ///
    /// 驱动关闭失败只记录日志，槽位照常释放。
    pub fn close_all(&self) {
        for fd in 0..self.capacity {
            let entry = {
                let mut inner = self.inner.lock();
                match core::mem::replace(&mut inner.slots[fd], Slot::Free) {
                    Slot::Open(entry) => {
                        inner.free.push_back(fd);
                        entry
                    }
                    other => {
                        inner.slots[fd] = other;
                        continue;
                    }
                }
            };
            Self::release_entry(entry);
        }
    }

    fn release_entry(entry: FdEntry) {
        if entry.shared.release() == Release::Last {
            if let Err(e) = entry.shared.close_driver() {
                warn!("vfs: close {} failed: {}", entry.shared.path(), e);
            }
        }
    }
}

impl Drop for FDTable {
    fn drop(&mut self) {
        self.close_all();
    }
}
