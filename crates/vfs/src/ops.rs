//! VFS 运行时操作 trait 定义和注册
//!
//! VFS 不认识进程模型：当前进程的描述符表和描述符表的默认容量都由内核
//! 通过 [`VfsOps`] 提供，并在启动时注册。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::FDTable;

/// VFS 运行时操作
///
/// 内核需要实现此 trait 并在启动时注册。
pub trait VfsOps: Send + Sync {
    /// 当前进程的文件描述符表，没有当前进程（例如启动早期）时返回 `None`
    fn current_fd_table(&self) -> Option<Arc<FDTable>>;

    /// 新建描述符表的默认槽位数
    fn default_max_fds(&self) -> usize;
}

static VFS_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static VFS_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册 VFS 操作实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_vfs_ops(ops: &'static dyn VfsOps) {
    let ptr = ops as *const dyn VfsOps;
    // SAFETY: 将 fat pointer 拆分为 data 和 vtable 两部分存储
    let (data, vtable) =
        unsafe { core::mem::transmute::<*const dyn VfsOps, (usize, usize)>(ptr) };
    VFS_OPS_VTABLE.store(vtable, Ordering::Release);
    VFS_OPS_DATA.store(data, Ordering::Release);
}

/// 获取已注册的 VFS 操作实现，未注册时返回 `None`
#[inline]
pub fn try_vfs_ops() -> Option<&'static dyn VfsOps> {
    let data = VFS_OPS_DATA.load(Ordering::Acquire);
    if data == 0 {
        return None;
    }
    let vtable = VFS_OPS_VTABLE.load(Ordering::Acquire);
    // SAFETY: 重组 register_vfs_ops 存入的 fat pointer
    Some(unsafe { &*core::mem::transmute::<(usize, usize), *const dyn VfsOps>((data, vtable)) })
}

/// 获取已注册的 VFS 操作实现
///
/// # Panics
/// 如果尚未调用 [`register_vfs_ops`] 注册实现，则 panic
#[inline]
pub fn vfs_ops() -> &'static dyn VfsOps {
    match try_vfs_ops() {
        Some(ops) => ops,
        None => panic!("vfs: VfsOps not registered"),
    }
}
