//! 架构相关操作的 Mock 实现
//!
//! 注意：这里不直接依赖 `sync` crate（避免循环依赖）。
//! 使用方在测试中为 [`MockArchOps`] 实现 `sync::ArchOps` 并注册。

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 架构操作
///
/// 用一个原子布尔值模拟“本地中断使能”状态，并统计关中断的次数。
pub struct MockArchOps {
    pub interrupt_state: AtomicBool,
    pub disable_count: AtomicUsize,
}

impl MockArchOps {
    pub const fn new() -> Self {
        Self {
            interrupt_state: AtomicBool::new(true),
            disable_count: AtomicUsize::new(0),
        }
    }

    pub unsafe fn read_and_disable_interrupts(&self) -> usize {
        self.disable_count.fetch_add(1, Ordering::Relaxed);
        self.interrupt_state.swap(false, Ordering::SeqCst) as usize
    }

    pub unsafe fn restore_interrupts(&self, flags: usize) {
        self.interrupt_state.store(flags != 0, Ordering::SeqCst);
    }

    /// 关中断被调用的总次数
    pub fn disable_count(&self) -> usize {
        self.disable_count.load(Ordering::Relaxed)
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();
