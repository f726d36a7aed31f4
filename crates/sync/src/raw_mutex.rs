//! `lock_api` 适配层
//!
//! 把原始自旋锁标志包装成 [`lock_api::RawMutex`]，并在持锁期间关闭本地中断。
//! `lock_api` 的加锁和解锁是两次独立调用，加锁前的中断状态保存在锁自身里。

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::arch_ops;
use crate::raw_spin_lock::RawSpinLock;

/// 实现 [`lock_api::RawMutex`] 的自旋锁
///
/// 加锁时保存的中断状态记录在锁内部，只有持锁者会写入。
pub struct RawSpin {
    lock: RawSpinLock,
    saved_flags: AtomicUsize,
}

impl RawSpin {
    fn save_flags(&self, flags: usize) {
        self.saved_flags.store(flags, Ordering::Relaxed);
    }
}

// SAFETY: lock/unlock 基于 RawSpinLock 的原子标志位，保证互斥
unsafe impl lock_api::RawMutex for RawSpin {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = RawSpin {
        lock: RawSpinLock::new(),
        saved_flags: AtomicUsize::new(0),
    };

    type GuardMarker = lock_api::GuardNoSend;

    fn lock(&self) {
        // SAFETY: 中断状态会在 unlock 中恢复
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        self.lock.acquire();
        self.save_flags(flags);
    }

    fn try_lock(&self) -> bool {
        // SAFETY: 同上；失败时立即恢复
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        if self.lock.try_acquire() {
            self.save_flags(flags);
            true
        } else {
            unsafe { arch_ops().restore_interrupts(flags) };
            false
        }
    }

    unsafe fn unlock(&self) {
        let flags = self.saved_flags.load(Ordering::Relaxed);
        self.lock.unlock();
        // SAFETY: flags 来自本次加锁时的 read_and_disable_interrupts
        unsafe { arch_ops().restore_interrupts(flags) };
    }

    fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}
