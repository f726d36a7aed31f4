//! 中断保护器
//!
//! 创建时禁用本地中断，销毁时恢复。
//!
//! 注意：禁用中断只能阻止**本地 CPU** 上任务与中断处理程序之间的并发，
//! 其他 CPU 的并行访问仍需要自旋锁。

use crate::arch_ops;

/// 中断保护器，基于 RAII 实现中断保护。
///
/// # 示例
/// ```ignore
/// {
///     let guard = IntrGuard::new(); // 禁用中断
///     // 临界区代码
/// } // 离开作用域，自动恢复中断状态
/// ```
pub struct IntrGuard {
    flags: usize,
}

impl IntrGuard {
    /// 原子地禁用中断并返回一个 IntrGuard 实例。
    pub fn new() -> Self {
        // SAFETY: 保存的状态会在 drop 时原样恢复，保护器不可跨 CPU 移动
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        IntrGuard { flags }
    }

    /// 进入临界区前中断是否处于启用状态
    pub fn was_enabled(&self) -> bool {
        self.flags & arch_ops().interrupt_enable_mask() != 0
    }
}

impl Default for IntrGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IntrGuard {
    fn drop(&mut self) {
        // SAFETY: flags 来自 new() 中的 read_and_disable_interrupts
        unsafe { arch_ops().restore_interrupts(self.flags) };
    }
}
