//! 自旋锁
//!
//! [`SpinLock`] 就是以 [`RawSpin`] 为底层锁的 `lock_api::Mutex`，
//! 因此 `try_lock`、`get_mut`、`into_inner`、`MutexGuard::map` 等接口都直接可用。
//!
//! 持锁期间本地中断关闭，释放时恢复到加锁前的状态。
//! SpinLock 不可重入，也不要在持锁期间调用可能阻塞的代码。
//!
//! # 示例
//! ```ignore
//! let lock = SpinLock::new(0);
//! {
//!     let mut guard = lock.lock(); // 获取锁，禁用中断
//!     *guard += 1;
//! } // 离开作用域，释放锁并恢复中断
//! ```

use crate::raw_mutex::RawSpin;

/// 带数据的自旋锁
pub type SpinLock<T> = lock_api::Mutex<RawSpin, T>;

/// [`SpinLock`] 的 RAII 保护器
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpin, T>;
