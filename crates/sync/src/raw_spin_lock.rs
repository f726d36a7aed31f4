//! 原始自旋锁标志
//!
//! 基于原子标志位的忙等锁，本身不处理中断状态；
//! 中断的关闭与恢复由 [`crate::RawSpin`] 负责。

use core::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
};

/// 不携带数据、不处理中断的自旋锁标志
///
/// 不可重入：同一执行流嵌套调用 `acquire()` 会死锁。
#[derive(Debug)]
pub(crate) struct RawSpinLock {
    lock: AtomicBool,
}

impl RawSpinLock {
    pub(crate) const fn new() -> Self {
        RawSpinLock {
            lock: AtomicBool::new(false),
        }
    }

    /// 自旋直到拿到锁标志
    pub(crate) fn acquire(&self) {
        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.lock.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    pub(crate) fn try_acquire(&self) -> bool {
        self.lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub(crate) fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }
}
