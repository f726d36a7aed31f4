//! 同步原语
//!
//! 向 VFS 及其它内核模块提供基本的锁和同步原语，
//! 包括自旋锁、中断保护以及 `lock_api` 适配层。
//!
//! # 架构依赖
//!
//! 此 crate 通过 `ArchOps` trait 抽象架构相关操作。
//! 使用前必须调用 `register_arch_ops` 注册实现。

#![no_std]

mod intr_guard;
mod raw_mutex;
mod raw_spin_lock;
mod spin_lock;

pub use intr_guard::*;
pub use raw_mutex::RawSpin;
pub use spin_lock::{SpinLock, SpinLockGuard};

use core::sync::atomic::{AtomicUsize, Ordering};

/// 架构相关操作的 trait
///
/// 由内核实现并注册，提供本地中断控制
pub trait ArchOps: Send + Sync {
    /// 读取并禁用中断，返回之前的状态
    ///
    /// # Safety
    /// 调用者必须确保在适当的上下文中调用
    unsafe fn read_and_disable_interrupts(&self) -> usize;

    /// 恢复中断状态
    ///
    /// # Safety
    /// flags 必须是之前 read_and_disable_interrupts 返回的值
    unsafe fn restore_interrupts(&self, flags: usize);

    /// 中断使能位在状态字中的掩码
    fn interrupt_enable_mask(&self) -> usize;
}

/// 全局架构操作实例（存储 fat pointer 的两个部分）
static ARCH_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static ARCH_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册架构操作实现
///
/// # Safety
/// 必须在单线程环境下调用。重复注册时后一次覆盖前一次。
pub unsafe fn register_arch_ops(ops: &'static dyn ArchOps) {
    let ptr = ops as *const dyn ArchOps;
    // SAFETY: fat pointer 的布局是 (data, vtable)
    let (data, vtable) = unsafe { core::mem::transmute::<*const dyn ArchOps, (usize, usize)>(ptr) };
    ARCH_OPS_VTABLE.store(vtable, Ordering::Release);
    ARCH_OPS_DATA.store(data, Ordering::Release);
}

/// 是否已经注册了架构操作
pub fn arch_ops_registered() -> bool {
    ARCH_OPS_DATA.load(Ordering::Acquire) != 0
}

/// 获取架构操作实例
#[inline]
pub(crate) fn arch_ops() -> &'static dyn ArchOps {
    let data = ARCH_OPS_DATA.load(Ordering::Acquire);
    let vtable = ARCH_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        panic!("sync: ArchOps not registered, call register_arch_ops first");
    }
    // SAFETY: data 和 vtable 是通过 register_arch_ops 设置的有效指针
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ArchOps>((data, vtable)) }
}
